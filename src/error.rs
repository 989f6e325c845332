/// Lookup and input failures the CLI reports back to the user.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    UnknownTrail(String),
    UnknownSpecies(String),
    UnexpectedShape { layer: String, shape: String },
    InputClosed,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Error::UnknownTrail(ref name) => write!(
                f,
                "The trail '{}' does not exist in the geodatabase.",
                name
            ),
            Error::UnknownSpecies(ref code) => write!(
                f,
                "The species '{}' does not exist in the data available.",
                code
            ),
            Error::UnexpectedShape {
                ref layer,
                ref shape,
            } => write!(f, "Found a {} shape in the {} layer.", shape, layer),
            Error::InputClosed => write!(f, "Input closed before a valid answer was given."),
        }
    }
}

impl std::error::Error for Error {}
