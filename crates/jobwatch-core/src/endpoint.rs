//! Status endpoint URLs for one import job.

use url::Url;

use crate::transport::TransportError;

/// Builds the poll and stream URLs under an API base URL.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        let base = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidEndpoint(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(TransportError::InvalidEndpoint(base_url.to_string()));
        }
        Ok(Self { base })
    }

    /// `GET {base}/api/import-jobs/{job_id}/status`, authenticated by bearer header.
    pub fn status_url(&self, job_id: &str) -> Result<Url, TransportError> {
        self.job_url(job_id, "status")
    }

    /// `GET {base}/api/import-jobs/{job_id}/stream?token=...`; push connections
    /// cannot carry headers, so the token rides in the query string.
    pub fn stream_url(&self, job_id: &str, token: &str) -> Result<Url, TransportError> {
        let mut url = self.job_url(job_id, "stream")?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }

    fn job_url(&self, job_id: &str, leaf: &str) -> Result<Url, TransportError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidEndpoint(self.base.to_string()))?
            .pop_if_empty()
            .extend(["api", "import-jobs", job_id, leaf]);
        Ok(url)
    }
}
