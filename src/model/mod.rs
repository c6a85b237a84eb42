//! Document model types shared by rendering and export.
//!
//! Markdown is parsed into [`Element`]s, laid out into [`VisualBlock`]s that
//! carry a [`Fragment`] display list, packed into [`Page`]s, captured as
//! [`RasterImage`]s and finally assembled into a [`Document`].

mod block;
mod document;
mod element;
mod fragment;
mod geometry;
mod image;
mod page;
mod paragraph;
mod table;

pub use block::{BlockKind, VisualBlock};
pub use document::{Document, Metadata};
pub use element::{Element, List, ListItem};
pub use fragment::{Color, DrawOp, Embedded, FontFamily, FontSpec, Fragment, Rect, Stroke};
pub use geometry::{PageGeometry, PaperSize, Unit};
pub use image::RasterImage;
pub use page::{BlockSummary, Page, PageSummary};
pub use paragraph::{plain_text, Inline, TextRun, TextStyle};
pub use table::{Alignment, Table, TableCell, TableRow};
