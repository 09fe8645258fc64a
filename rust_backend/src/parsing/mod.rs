//! Parsers for the raw HR source files.
//!
//! The office rosters and the HR table are published as record-oriented XML:
//! a root element whose children are rows and whose grandchildren are fields.
//!
//! # Example
//!
//! ```no_run
//! use hr_analysis::parsing::xml_parser::parse_records_file;
//! use std::path::Path;
//!
//! let df = parse_records_file(Path::new("../Data/hr_data.xml"))
//!     .expect("Failed to parse HR data");
//! println!("{} employees", df.height());
//! ```

pub mod xml_parser;


pub use xml_parser::{parse_records_bytes, parse_records_file, parse_records_str};
