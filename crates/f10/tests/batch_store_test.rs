//! Integration tests for batch runs into a SQLite store.

use f10::data::{DataError, Fetcher, ListEntry, SqliteStore};
use f10::extraction::{Source, TableTag};
use f10::{BatchConfig, run_batch};
use std::collections::BTreeSet;
use std::time::Duration;

const PROFILE_PAGE: &str = r#"<html><body>
<table class="table_bg001 border_box limit_sale table_details">
  <tr><td>组织形式</td><td>股份有限公司</td><td>地域</td><td>上海市</td></tr>
</table>
<h2 class="title_01"><ul><li>更新日期：2023-04-28</li></ul></h2>
<table class="table_bg001 border_box limit_sale">
  <tr><th>姓名</th><th>职务</th><th>起止时间</th><th>持股数(万股)</th><th>报酬(元)</th></tr>
  <tr><td>张三</td><td>董事长</td><td>2020-01-01至今</td><td>--</td><td>100</td></tr>
</table>
</body></html>"#;

struct PageFetcher;

impl Fetcher for PageFetcher {
    async fn fetch(&self, source: Source, company_code: &str) -> f10::data::Result<String> {
        match (source, company_code) {
            (Source::Statement(_), "600000") => {
                Ok("报告日期,2023-03-31,2022-12-31,\n营业收入(万元),10,20,\n".to_string())
            }
            (Source::ProfilePage, "600000") => Ok(PROFILE_PAGE.to_string()),
            _ => Err(DataError::CompanyNotFound(company_code.to_string())),
        }
    }
}

#[tokio::test]
async fn test_statement_and_profile_units() {
    let store = SqliteStore::in_memory().unwrap();
    let config = BatchConfig {
        delay: Duration::ZERO,
        ..BatchConfig::default()
    };
    let entries = vec![
        ListEntry::new("600000", "2"),
        ListEntry::new("600000", "6"),
        ListEntry::new("600000", "4"),
    ];

    let report = run_batch(&entries, &BTreeSet::new(), &PageFetcher, &store, &config).await;

    // the short profile block fails the corporate layout, so unit 4 stores nothing
    assert_eq!(report.stored(), 2);
    assert_eq!(report.problems(), vec![ListEntry::new("600000", "4")]);
    assert_eq!(store.count_rows(TableTag::PL).unwrap(), 2);
    assert_eq!(store.count_rows(TableTag::BD).unwrap(), 1);
    assert_eq!(store.count_rows(TableTag::CI).unwrap(), 0);
    assert_eq!(
        store.lookup(TableTag::BD, "600000", "姓名").unwrap(),
        Some("张三".to_string())
    );
}
