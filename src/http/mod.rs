pub mod decode;
pub mod headers;
pub mod method;
pub mod multipart;
pub mod request;
pub mod requestbody;
pub mod response;
pub mod retry;
pub mod transaction;
pub mod uri;
pub mod wire;

// Re-exports for convenience
pub use headers::{Header, HeaderList};
pub use method::{Method, Version};
pub use request::Request;
pub use requestbody::{FileSource, LocalFile, RequestBody, UploadFile, UploadFileCollection};
pub use response::Response;
pub use uri::Uri;
