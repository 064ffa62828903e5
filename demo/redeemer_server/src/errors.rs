use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
};

#[derive(Debug)]
pub(crate) struct InvalidInputError<T: Display + Debug>(pub(crate) T);

impl<T: Display + Debug> Display for InvalidInputError<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "invalid input from client: {}", self.0)
    }
}
impl<T: Display + Debug> Error for InvalidInputError<T> {}
