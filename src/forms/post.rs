use crate::domain::PostBody;
use crate::forms::{data_required, post_length, FormErrors};

#[derive(serde::Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub post: String,
}

impl PostForm {
    pub fn validate(&self) -> Result<PostBody, FormErrors> {
        let mut errors = FormErrors::default();
        if !errors.check(self, "post", &self.post, &[data_required, post_length]) {
            return Err(errors);
        }
        PostBody::parse(self.post.clone()).map_err(|_| {
            let mut errors = FormErrors::default();
            errors.add("post", crate::i18n::Message::PostLength);
            errors
        })
    }
}
