use core::fmt;

/// Validation failures reported by the checked constructors.
///
/// Violations detected inside the numeric passes are not represented here;
/// those indicate a caller defect and panic instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    SizeMismatch { expected: usize, actual: usize },
    EmptyGrid { width: usize, height: usize },
    InvalidWindow { width: usize, height: usize },
    InvalidLambda(f64),
    InvalidThreshold(f64),
    InvalidRatio(f64),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::EmptyGrid { width, height } => {
                write!(f, "grid dimensions must be positive, got {width}x{height}")
            }
            Self::InvalidWindow { width, height } => {
                write!(
                    f,
                    "window must have odd positive dimensions, got {width}x{height}"
                )
            }
            Self::InvalidLambda(v) => write!(f, "lambda must lie in (0, 0.25), got {v}"),
            Self::InvalidThreshold(v) => write!(f, "response threshold must be finite, got {v}"),
            Self::InvalidRatio(v) => write!(f, "edge ratio must lie in (0, 1], got {v}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn display_mentions_offending_values() {
        let msg = Error::InvalidWindow {
            width: 4,
            height: 5,
        }
        .to_string();
        assert!(msg.contains("4x5"), "{msg}");

        let msg = Error::SizeMismatch {
            expected: 9,
            actual: 8,
        }
        .to_string();
        assert_eq!(msg, "size mismatch: expected 9, got 8");
    }
}
