use unicode_segmentation::UnicodeSegmentation;

pub const MAX_USERNAME_LENGTH: usize = 64;

#[derive(Debug, Clone)]
pub struct Username(String);

impl Username {
    /// Returns an instance of `Username` if the input is non-empty after trimming and at most
    /// 64 graphemes long.
    pub fn parse(s: String) -> Result<Username, String> {
        let s = s.trim().to_string();
        if s.is_empty() {
            return Err("Username cannot be empty.".to_string());
        }
        // a grapheme is defined by the Unicode standard as a "user-perceived" character;
        // `å` is a single grapheme, but it is composed of two characters (`a` and `̊`)
        if s.graphemes(true).count() > MAX_USERNAME_LENGTH {
            return Err(format!("{} is too long to be a username.", s));
        }
        Ok(Self(s))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
