//! EPUB 打包适配器

mod epub_packager;
mod xhtml;
mod zip_writer;

pub use epub_packager::EpubPackager;
pub use xhtml::{ManifestItem, STYLESHEET};
pub use zip_writer::ZipArchiveWriter;
