use super::AppState;
use crate::ports::encoder::RenditionEncoder;
use axum::{extract::State, response::Html};
use std::sync::Arc;

/// `index.html` from the public directory, or the built-in upload form.
pub async fn index_page<E>(State(state): State<Arc<AppState<E>>>) -> Html<String>
where
    E: RenditionEncoder + 'static,
{
    match tokio::fs::read_to_string(state.public_dir.join("index.html")).await {
        Ok(page) => Html(page),
        Err(_) => Html(UPLOAD_FORM.to_string()),
    }
}

const UPLOAD_FORM: &str = r#"<!doctype html>
<html>
    <head>
        <title>Upload a video</title>
    </head>
    <body>
        <h1>Convert a video to HLS</h1>
        <form action="/process-video" method="post" enctype="multipart/form-data">
            <div>
                <label>
                    Video file:
                    <input type="file" name="video" accept="video/*">
                </label>
            </div>
            <div>
                <label>
                    or URL:
                    <input type="url" name="videoUrl">
                </label>
            </div>
            <div>
                <input type="submit" value="Process video">
            </div>
        </form>
    </body>
</html>
"#;
