use super::jobs::RenditionSpec;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Codec tags advertised for every variant: H.264 Main 3.1 + AAC-LC.
pub const CODECS: &str = "avc1.4d401f,mp4a.40.2";

/// Advertised frame rate. Not probed from the source.
pub const FRAME_RATE: &str = "30.000";

pub struct VariantStream {
    pub bandwidth: u64,
    pub width: u32,
    pub height: u32,
    pub codecs: &'static str,
    pub frame_rate: &'static str,
    pub uri: String,
}

impl From<&RenditionSpec> for VariantStream {
    fn from(spec: &RenditionSpec) -> Self {
        Self {
            bandwidth: spec.bandwidth,
            width: spec.width(),
            height: spec.height,
            codecs: CODECS,
            frame_rate: FRAME_RATE,
            uri: spec.playlist_uri(),
        }
    }
}

pub struct MasterPlaylist {
    pub version: u8,
    pub independent_segments: bool,
    pub variants: Vec<VariantStream>,
}

impl MasterPlaylist {
    pub fn new() -> Self {
        Self {
            version: 4,
            independent_segments: true,
            variants: Vec::new(),
        }
    }

    /// One variant per rendition, in ladder order.
    pub fn from_renditions<'a, I>(renditions: I) -> Self
    where
        I: IntoIterator<Item = &'a RenditionSpec>,
    {
        let mut playlist = Self::new();
        for spec in renditions {
            playlist.add_variant(VariantStream::from(spec));
        }
        playlist
    }

    pub fn add_variant(&mut self, variant: VariantStream) {
        self.variants.push(variant);
    }

    pub fn render(&self) -> String {
        let mut out = String::from("#EXTM3U\n");
        out.push_str(&format!("#EXT-X-VERSION:{}\n", self.version));
        if self.independent_segments {
            out.push_str("#EXT-X-INDEPENDENT-SEGMENTS\n");
        }
        for v in &self.variants {
            out.push_str(&format!(
                "#EXT-X-STREAM-INF:BANDWIDTH={},CODECS=\"{}\",RESOLUTION={}x{},FRAME-RATE={}\n",
                v.bandwidth, v.codecs, v.width, v.height, v.frame_rate
            ));
            out.push_str(&v.uri);
            out.push('\n');
        }
        out
    }

    /// Writes the playlist, replacing any existing file.
    pub async fn write_to(&self, path: &Path) -> Result<(), std::io::Error> {
        let mut file = File::create(path).await?;
        file.write_all(self.render().as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

impl Default for MasterPlaylist {
    fn default() -> Self {
        Self::new()
    }
}

/// Master playlist text for renditions that all encoded successfully.
pub fn build(renditions: &[RenditionSpec]) -> String {
    MasterPlaylist::from_renditions(renditions).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::jobs::RenditionLadder;
    use tempfile::tempdir;
    use tokio::fs;

    #[test]
    fn test_master_playlist_exact_text() {
        let ladder = RenditionLadder::from_lists(&[480, 720], &[1_000_000, 2_000_000]).unwrap();
        let text = build(ladder.renditions());

        let expected = "#EXTM3U\n\
#EXT-X-VERSION:4\n\
#EXT-X-INDEPENDENT-SEGMENTS\n\
#EXT-X-STREAM-INF:BANDWIDTH=1000000,CODECS=\"avc1.4d401f,mp4a.40.2\",RESOLUTION=853x480,FRAME-RATE=30.000\n\
480/output.m3u8\n\
#EXT-X-STREAM-INF:BANDWIDTH=2000000,CODECS=\"avc1.4d401f,mp4a.40.2\",RESOLUTION=1280x720,FRAME-RATE=30.000\n\
720/output.m3u8\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_one_stanza_per_rendition_in_input_order() {
        let ladder = RenditionLadder::default();
        let text = build(ladder.renditions());

        let stanzas: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("#EXT-X-STREAM-INF:"))
            .collect();
        assert_eq!(stanzas.len(), 3);
        assert!(stanzas[2].contains("RESOLUTION=1920x1080"));
        assert!(stanzas[2].contains("BANDWIDTH=5000000"));

        let uris: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(
            uris,
            vec!["480/output.m3u8", "720/output.m3u8", "1080/output.m3u8"]
        );
    }

    #[tokio::test]
    async fn test_write_to_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("master.m3u8");
        fs::write(&path, "stale content that is longer than nothing")
            .await
            .unwrap();

        let playlist = MasterPlaylist::from_renditions(&[RenditionSpec::new(720, 2_800_000)]);
        playlist.write_to(&path).await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, playlist.render());
        assert!(content.starts_with("#EXTM3U\n#EXT-X-VERSION:4\n"));
    }
}
