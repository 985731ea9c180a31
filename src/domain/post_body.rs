use unicode_segmentation::UnicodeSegmentation;

pub const MAX_POST_LENGTH: usize = 140;

#[derive(Debug, Clone)]
pub struct PostBody(String);

impl PostBody {
    pub fn parse(s: String) -> Result<PostBody, String> {
        let s = s.trim().to_string();
        let length = s.graphemes(true).count();
        if length == 0 || length > MAX_POST_LENGTH {
            return Err(format!(
                "A post must be between 1 and {} characters long.",
                MAX_POST_LENGTH
            ));
        }
        Ok(Self(s))
    }
}

impl AsRef<str> for PostBody {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
