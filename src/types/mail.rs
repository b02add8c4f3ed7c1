use serde::Serialize;

#[derive(Serialize, Debug, Clone)]
pub struct SendEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: Option<String>,
    pub text: Option<String>,
    pub reply_to: Option<Vec<String>>,
}

impl Default for SendEmail {
    fn default() -> Self {
        Self {
            from: "noreply@flowtels.com".to_string(),
            to: vec![],
            subject: "".to_string(),
            html: None,
            text: None,
            reply_to: None,
        }
    }
}
