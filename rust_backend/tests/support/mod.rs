//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use hr_analysis::config::SourceConfig;
use hr_analysis::io::Fetcher;
use hr_analysis::output::{Literal, Presenter};
use hr_analysis::{PipelineConfig, PipelineError, PipelineResult};

/// One employee as split across an office roster and the HR table.
#[derive(Debug, Clone)]
pub struct Employee {
    pub office: char,
    pub id: i64,
    pub satisfaction: f64,
    pub evaluation: f64,
    pub projects: i64,
    pub hours: i64,
    pub tenure: i64,
    pub accident: i64,
    pub promotion: i64,
    pub department: &'static str,
    pub salary: &'static str,
    pub left: i64,
}

impl Employee {
    pub fn key(&self) -> String {
        format!("{}{}", self.office, self.id)
    }
}

#[allow(clippy::too_many_arguments)]
fn employee(
    office: char,
    id: i64,
    satisfaction: f64,
    evaluation: f64,
    projects: i64,
    hours: i64,
    tenure: i64,
    accident: i64,
    promotion: i64,
    department: &'static str,
    salary: &'static str,
    left: i64,
) -> Employee {
    Employee {
        office,
        id,
        satisfaction,
        evaluation,
        projects,
        hours,
        tenure,
        accident,
        promotion,
        department,
        salary,
        left,
    }
}

/// Twelve employees present in both an office roster and HR.
pub fn employees() -> Vec<Employee> {
    vec![
        employee('A', 4, 0.72, 0.53, 6, 280, 3, 0, 0, "IT", "high", 0),
        employee('A', 3033, 0.11, 0.7, 2, 200, 4, 1, 1, "sales", "medium", 0),
        employee('A', 10, 0.5, 0.6, 3, 150, 3, 0, 0, "IT", "medium", 0),
        employee('A', 125, 0.9, 0.95, 5, 260, 5, 0, 0, "hr", "low", 1),
        employee('A', 7, 0.3, 0.45, 7, 310, 4, 0, 0, "sales", "high", 1),
        employee('A', 8, 0.6, 0.5, 4, 170, 3, 1, 1, "IT", "low", 0),
        employee('B', 7064, 0.4, 0.8, 4, 150, 3, 0, 0, "IT", "low", 1),
        employee('B', 4, 0.8, 0.65, 3, 190, 2, 0, 0, "sales", "low", 0),
        employee('B', 12, 0.2, 0.9, 6, 300, 5, 0, 0, "IT", "high", 1),
        employee('B', 13, 0.7, 0.55, 2, 140, 2, 1, 0, "hr", "medium", 0),
        employee('B', 14, 0.65, 0.75, 5, 220, 4, 0, 0, "IT", "medium", 0),
        employee('B', 15, 0.35, 0.5, 6, 240, 3, 0, 0, "sales", "high", 1),
    ]
}

/// Office roster XML; `extra_ids` adds employees unknown to HR.
pub fn office_xml(employees: &[Employee], office: char, extra_ids: &[i64]) -> String {
    let mut xml = String::from("<?xml version='1.0' encoding='utf-8'?>\n<data>\n");
    for e in employees.iter().filter(|e| e.office == office) {
        let _ = writeln!(
            xml,
            "  <row>\n    <employee_office_id>{}</employee_office_id>\n    \
             <satisfaction_level>{}</satisfaction_level>\n    \
             <last_evaluation>{}</last_evaluation>\n    \
             <number_project>{}</number_project>\n    \
             <average_monthly_hours>{}</average_monthly_hours>\n    \
             <time_spend_company>{}</time_spend_company>\n    \
             <Work_accident>{}</Work_accident>\n    \
             <promotion_last_5years>{}</promotion_last_5years>\n  </row>",
            e.id,
            e.satisfaction,
            e.evaluation,
            e.projects,
            e.hours,
            e.tenure,
            e.accident,
            e.promotion
        );
    }
    for id in extra_ids {
        let _ = writeln!(
            xml,
            "  <row>\n    <employee_office_id>{id}</employee_office_id>\n    \
             <satisfaction_level>0.5</satisfaction_level>\n    \
             <last_evaluation>0.5</last_evaluation>\n    \
             <number_project>3</number_project>\n    \
             <average_monthly_hours>999</average_monthly_hours>\n    \
             <time_spend_company>3</time_spend_company>\n    \
             <Work_accident>0</Work_accident>\n    \
             <promotion_last_5years>0</promotion_last_5years>\n  </row>"
        );
    }
    xml.push_str("</data>\n");
    xml
}

/// HR table XML; `extra_keys` adds employees unknown to both offices.
pub fn hr_xml(employees: &[Employee], extra_keys: &[&str]) -> String {
    let mut xml = String::from("<?xml version='1.0' encoding='utf-8'?>\n<data>\n");
    for e in employees {
        let _ = writeln!(
            xml,
            "  <row>\n    <employee_id>{}</employee_id>\n    <Department>{}</Department>\n    \
             <salary>{}</salary>\n    <left>{}</left>\n  </row>",
            e.key(),
            e.department,
            e.salary,
            e.left
        );
    }
    for key in extra_keys {
        let _ = writeln!(
            xml,
            "  <row>\n    <employee_id>{key}</employee_id>\n    <Department>IT</Department>\n    \
             <salary>low</salary>\n    <left>0</left>\n  </row>"
        );
    }
    xml.push_str("</data>\n");
    xml
}

/// The three payloads of the standard fixture: office A, office B, HR.
pub fn payloads() -> [String; 3] {
    let employees = employees();
    [
        office_xml(&employees, 'A', &[]),
        office_xml(&employees, 'B', &[99]),
        hr_xml(&employees, &["A999"]),
    ]
}

/// Configuration caching into `dir`, with the default source URLs.
pub fn config_in(dir: &Path) -> PipelineConfig {
    PipelineConfig {
        sources: SourceConfig::in_dir(dir),
        ..PipelineConfig::default()
    }
}

/// Write the standard fixture into the cache directory of `sources`.
pub fn write_cache(sources: &SourceConfig) {
    fs::create_dir_all(&sources.data_dir).unwrap();
    for (source, payload) in sources.ordered().into_iter().zip(payloads()) {
        fs::write(sources.path_of(source), payload).unwrap();
    }
}

/// Serves canned payloads by URL and records every request.
#[derive(Default)]
pub struct FixtureFetcher {
    payloads: HashMap<String, Vec<u8>>,
    pub requests: RefCell<Vec<String>>,
}

impl FixtureFetcher {
    /// Serve the standard fixture at the URLs of `sources`.
    pub fn serving(sources: &SourceConfig) -> Self {
        let payloads = sources
            .ordered()
            .into_iter()
            .zip(payloads())
            .map(|(source, payload)| (source.url.clone(), payload.into_bytes()))
            .collect();
        Self {
            payloads,
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl Fetcher for FixtureFetcher {
    fn fetch(&self, url: &str) -> PipelineResult<Vec<u8>> {
        self.requests.borrow_mut().push(url.to_string());
        self.payloads
            .get(url)
            .cloned()
            .ok_or_else(|| PipelineError::Fetch {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            })
    }
}

/// Keeps every emitted diagnostic as `(stage, label, rendered value)`.
#[derive(Default)]
pub struct Recorder {
    pub lines: Vec<(String, String, String)>,
}

impl Recorder {
    pub fn rendered(&self) -> Vec<&str> {
        self.lines.iter().map(|(_, _, value)| value.as_str()).collect()
    }
}

impl Presenter for Recorder {
    fn emit(&mut self, stage: &str, label: &str, value: &Literal) -> PipelineResult<()> {
        self.lines
            .push((stage.to_string(), label.to_string(), value.render(None)));
        Ok(())
    }
}
