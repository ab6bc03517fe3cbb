use super::*;

#[derive(Deserialize)]
pub struct General {
    #[serde(default = "listen")]
    listen: String,

    // directory holding one sub-directory of snapshot files per project
    #[serde(default = "snapshots")]
    snapshots: String,

    // upper bound on the time spent waiting for the collaborators while
    // serving one request
    #[serde(default = "request_timeout")]
    request_timeout: String,
}

impl Default for General {
    fn default() -> Self {
        Self {
            listen: listen(),
            snapshots: snapshots(),
            request_timeout: request_timeout(),
        }
    }
}

impl General {
    pub fn check(&self) -> Result<(), String> {
        let timeout = parse_duration("request_timeout", &self.request_timeout)?;

        if timeout.is_zero() {
            return Err("request_timeout must be greater than zero".to_string());
        }

        Ok(())
    }

    pub fn listen(&self) -> Result<SocketAddr, String> {
        self.listen
            .to_socket_addrs()
            .map_err(|e| format!("bad listen address: {e}"))?
            .next()
            .ok_or_else(|| "could not resolve socket addr".to_string())
    }

    pub fn snapshots(&self) -> PathBuf {
        self.snapshots.clone().into()
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        parse_duration("request_timeout", &self.request_timeout)
            .unwrap_or(std::time::Duration::from_secs(30))
    }
}
