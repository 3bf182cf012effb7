//! Coffee AI Common Library
//!
//! HTTPサーバーとCLIで共有される型とユーティリティ

pub mod types;
pub mod error;
pub mod detector;
pub mod parser;
pub mod prompts;

pub use types::{BrewStep, BrewingProfile, CoffeeAnalysis, ImageFormat};
pub use error::{Error, Result};
pub use detector::{detect_image_format, strip_data_url};
pub use parser::{normalize_response, strip_code_fence, ParseFailure};
pub use prompts::{build_analysis_prompt, PROMPT_VERSION};
