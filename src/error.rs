use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the catalog")]
    Catalog,
    #[display("library operation failed")]
    Library,
    /// Built without a PDF backend.
    #[display("no PDF renderer available; rebuild with `--features pdfium`")]
    NoRenderer,
    #[display("invalid argument: {_0}")]
    Argument(#[error(not(source))] String),
}
