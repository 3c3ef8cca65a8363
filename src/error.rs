pub type CumuloResult<T> = Result<T, CumuloError>;

#[derive(thiserror::Error, Debug)]
pub enum CumuloError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("input error: {0}")]
    Input(String),

    #[error("resource error: {0}")]
    Resource(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CumuloError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}

impl From<std::io::Error> for CumuloError {
    fn from(err: std::io::Error) -> Self {
        Self::Resource(err.to_string())
    }
}

impl From<image::ImageError> for CumuloError {
    fn from(err: image::ImageError) -> Self {
        Self::Resource(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            CumuloError::configuration("x")
                .to_string()
                .contains("configuration error:")
        );
        assert!(CumuloError::input("x").to_string().contains("input error:"));
        assert!(
            CumuloError::resource("x")
                .to_string()
                .contains("resource error:")
        );
    }

    #[test]
    fn io_errors_map_to_resource() {
        let err: CumuloError = std::io::Error::other("boom").into();
        assert!(matches!(err, CumuloError::Resource(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = CumuloError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
