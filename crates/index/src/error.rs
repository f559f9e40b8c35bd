#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    #[error("could not reach the search backend")]
    Unreachable(#[source] reqwest::Error),
    #[error("search backend returned {status}")]
    BackendError { status: reqwest::StatusCode },
    #[error("could not decode the search backend's response")]
    MalformedResponse(#[source] reqwest::Error),
}
