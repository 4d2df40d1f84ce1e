use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("attribute `{name}` is stored, but not as a `{expected}`")]
    TypeMismatch {
        name: &'static str,
        expected: &'static str,
    },
}
