/// Hands a deep link to the host OS or browser. Fire and forget.
pub trait DeepLinkOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Opener for hosts without a browser: only logs the link.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOpener;

impl DeepLinkOpener for LogOpener {
    fn open(&self, url: &str) {
        log::info!("open deep link: {url}");
    }
}
