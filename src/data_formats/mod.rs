mod request;
mod response;
mod wrapper;

pub use request::*;
pub use response::*;
pub use wrapper::*;

use serde::{Deserialize, Serialize};

/// `?page=` as typed by the visitor. Parsed leniently by
/// [`crate::feed::parse_page_number`].
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> i64 {
        crate::feed::parse_page_number(self.page.as_deref())
    }
}
