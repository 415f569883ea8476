use reqwest::blocking::{Request, Response};

/// Executes one prepared request. Implementations must not retry.
pub trait HttpClient {
    fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
