use once_cell::sync::Lazy;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

/// The runtime the caller is already running on, or the shared one.
pub fn runtime_handle() -> Handle {
    Handle::try_current().unwrap_or_else(|_| RUNTIME.handle().clone())
}

/// Runs `fut` in the background and posts its output to the main context's
/// queue. Nothing from `fut` touches main-context state directly. If `fut`
/// panics, `on_failure` builds the value posted in its place, so every call
/// posts exactly once.
pub fn run_async_to_main<T, Fut, F>(
    handle: &Handle,
    main: UnboundedSender<T>,
    fut: Fut,
    on_failure: F,
)
where
    T: Send + 'static,
    Fut: std::future::Future<Output = T> + Send + 'static,
    F: FnOnce(String) -> T + Send + 'static,
{
    let task = handle.spawn(fut);
    handle.spawn(async move {
        let out = match task.await {
            Ok(out) => out,
            Err(e) => on_failure(e.to_string()),
        };
        let _ = main.send(out);
    });
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_url_adds_missing_scheme() {
        assert_eq!(normalize_url(" support.example.com "), "https://support.example.com");
        assert_eq!(normalize_url("http://localhost:8080"), "http://localhost:8080");
    }

    #[tokio::test]
    async fn background_result_reaches_main_queue() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        run_async_to_main(&runtime_handle(), tx, async { 41 + 1 }, |_| 0);
        assert_eq!(rx.recv().await, Some(42));
    }

    async fn blow_up() -> Result<u32, String> {
        panic!("backend blew up")
    }

    #[tokio::test]
    async fn panicking_future_posts_failure_value() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Result<u32, String>>();
        run_async_to_main(&runtime_handle(), tx, blow_up(), Err);
        let posted = rx.recv().await.unwrap();
        assert!(posted.unwrap_err().contains("panicked"));
    }
}
