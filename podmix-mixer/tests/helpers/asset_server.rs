//! Local HTTP server standing in for the music asset host
//!
//! Serves fixed byte bodies on an ephemeral port; any other path is a 404.

use axum::routing::get;
use axum::Router;
use tokio::task::JoinHandle;

pub struct AssetServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl AssetServer {
    /// Start serving `routes` (path, body) on 127.0.0.1
    pub async fn start(routes: Vec<(&'static str, Vec<u8>)>) -> Self {
        let mut app = Router::new();
        for (path, body) in routes {
            app = app.route(
                path,
                get(move || {
                    let body = body.clone();
                    async move { body }
                }),
            );
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for AssetServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
