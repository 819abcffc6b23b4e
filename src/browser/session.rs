use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use super::{BrowserHandle, Launcher, Page};
use crate::error::Result;
use crate::settings::BrowserSettings;

/// One browser process and page, held for the duration of a run.
pub struct Session {
    handle: Option<Box<dyn BrowserHandle>>,
}

impl Session {
    pub async fn acquire(launcher: &dyn Launcher, settings: &BrowserSettings) -> Result<Self> {
        let handle = launcher.launch(settings).await?;
        info!("Browser session opened (headless={})", settings.headless);
        Ok(Self {
            handle: Some(handle),
        })
    }

    pub fn page(&self) -> Arc<dyn Page> {
        match &self.handle {
            Some(h) => h.page(),
            None => unreachable!("session used after release"),
        }
    }

    /// Close the browser. Close errors are logged, never returned.
    pub async fn release(mut self) {
        if let Some(mut handle) = self.handle.take() {
            match handle.close().await {
                Ok(()) => info!("Browser session closed"),
                Err(e) => warn!("Browser close failed: {}", e),
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("Browser session dropped without release; process is killed on drop");
        }
    }
}

/// Run `f` against a fresh session and release it whatever `f` returns.
pub async fn with_session<T, F, Fut>(
    launcher: &dyn Launcher,
    settings: &BrowserSettings,
    f: F,
) -> Result<T>
where
    F: FnOnce(Arc<dyn Page>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let session = Session::acquire(launcher, settings).await?;
    let result = f(session.page()).await;
    session.release().await;
    result
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{FakeLauncher, FakePage};
    use crate::error::ScrapeError;

    #[tokio::test]
    async fn released_after_success() {
        let launcher = FakeLauncher::new(FakePage::default());
        let out = with_session(&launcher, &BrowserSettings::default(), |page| async move {
            page.navigate("https://dexscreener.com/").await?;
            page.current_url().await
        })
        .await
        .unwrap();
        assert_eq!(out, "https://dexscreener.com/");
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn released_after_error() {
        let launcher = FakeLauncher::new(FakePage::default());
        let out: Result<()> = with_session(&launcher, &BrowserSettings::default(), |_page| async {
            Err(ScrapeError::ControlNotFound("Top Traders".into()))
        })
        .await;
        assert!(matches!(out, Err(ScrapeError::ControlNotFound(_))));
        assert_eq!(launcher.closes(), 1);
    }

    #[tokio::test]
    async fn launch_failure_propagates() {
        let mut launcher = FakeLauncher::new(FakePage::default());
        launcher.fail = true;
        let out: Result<()> =
            with_session(&launcher, &BrowserSettings::default(), |_page| async { Ok(()) }).await;
        assert!(matches!(out, Err(ScrapeError::LaunchFailure(_))));
        assert_eq!(launcher.closes(), 0);
    }
}
