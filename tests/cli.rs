use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn data(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests/data");
    path.push(name);
    path.to_string_lossy().into_owned()
}

fn taxlots(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_taxlots"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run taxlots")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "taxlots failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout.clone()).expect("stdout is not utf-8")
}

#[test]
fn fifo_disposals_csv() {
    let out = stdout(&taxlots(&["disposals", &data("two_lots.csv"), "--csv"]));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "asset,acquired,basis,disposed,proceeds",
            "BTC,2020-01-01,100.00,2021-01-15,300.00",
            "BTC,2020-02-01,100.00,2021-01-15,150.00",
        ]
    );
}

#[test]
fn lifo_disposals_csv() {
    let out = stdout(&taxlots(&[
        "disposals",
        &data("two_lots.csv"),
        "--method",
        "lifo",
        "--csv",
    ]));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "asset,acquired,basis,disposed,proceeds",
            "BTC,2020-02-01,200.00,2021-01-15,300.00",
            "BTC,2020-01-01,50.00,2021-01-15,150.00",
        ]
    );
}

#[test]
fn detailed_csv_has_terms() {
    let out = stdout(&taxlots(&[
        "disposals",
        &data("mixed_terms.csv"),
        "--csv",
        "--detailed",
    ]));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines[0],
        "asset,acquired,disposed,quantity,basis,proceeds,gain,holding_days,term"
    );
    assert_eq!(
        lines[1],
        "BTC,2019-01-01,2021-01-01,1,4000.00,30000.00,26000.00,731,Long-term"
    );
    assert_eq!(
        lines[2],
        "ETH,2020-06-01,2021-01-01,4,1000.00,3000.00,2000.00,214,Short-term"
    );
}

#[test]
fn disposals_read_from_stdin() {
    let input = std::fs::read(data("two_lots.csv")).expect("Failed to read fixture");
    let mut child = Command::new(env!("CARGO_BIN_EXE_taxlots"))
        .args(["disposals", "--csv"])
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn taxlots");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(&input)
        .expect("Failed to write stdin");
    let output = child.wait_with_output().expect("Failed to wait on taxlots");
    let out = stdout(&output);
    assert_eq!(out.lines().count(), 3);
    assert!(out.contains("BTC,2020-01-01,100.00,2021-01-15,300.00"));
}

#[test]
fn disposals_year_filter_excludes_other_years() {
    let out = stdout(&taxlots(&[
        "disposals",
        &data("two_lots.csv"),
        "--csv",
        "--year",
        "2020",
    ]));
    assert_eq!(out.lines().collect::<Vec<_>>(), vec!["asset,acquired,basis,disposed,proceeds"]);
}

#[test]
fn oversell_rejected_by_default() {
    let output = taxlots(&["disposals", &data("oversell.csv"), "--csv"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("insufficient ETH lots"), "{}", stderr);
    assert!(output.stdout.is_empty());
}

#[test]
fn oversell_allowed_with_warning() {
    let output = taxlots(&[
        "disposals",
        &data("oversell.csv"),
        "--csv",
        "--allow-oversell",
    ]);
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[1], "ETH,2021-01-01,1000.00,2021-03-01,2000.00");
    assert_eq!(lines.len(), 2);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("warning: ETH sale"), "{}", stderr);
    assert!(stderr.contains("exceeded open lots"), "{}", stderr);
}

#[test]
fn estimate_json_totals() {
    let out = stdout(&taxlots(&["estimate", &data("mixed_terms.csv"), "--json"]));
    let json: serde_json::Value = serde_json::from_str(&out).expect("Invalid JSON output");
    assert_eq!(json["method"], "FIFO");
    assert_eq!(json["year"], "All Years");
    let total = &json["total"];
    assert_eq!(total["disposals"], 2);
    assert_eq!(total["long_term_gain"], "26000.00");
    assert_eq!(total["short_term_gain"], "2000.00");
    assert_eq!(total["tax_owed"], "4640.00");
    assert!(json.get("assets").is_none());
}

#[test]
fn estimate_custom_rates_by_asset() {
    let out = stdout(&taxlots(&[
        "estimate",
        &data("mixed_terms.csv"),
        "--json",
        "--by-asset",
        "--long-term-rate",
        "0.2",
        "--short-term-rate",
        "0.3",
    ]));
    let json: serde_json::Value = serde_json::from_str(&out).expect("Invalid JSON output");
    // 26000 * 0.2 + 2000 * 0.3
    assert_eq!(json["total"]["tax_owed"], "5800.00");
    let assets = json["assets"].as_array().expect("assets array");
    assert_eq!(assets.len(), 2);
    assert_eq!(assets[0]["asset"], "BTC");
    assert_eq!(assets[0]["tax_owed"], "5200.00");
    assert_eq!(assets[1]["asset"], "ETH");
    assert_eq!(assets[1]["tax_owed"], "600.00");
}

#[test]
fn estimate_rejects_rate_above_one() {
    let output = taxlots(&[
        "estimate",
        &data("mixed_terms.csv"),
        "--long-term-rate",
        "15",
    ]);
    assert!(!output.status.success());
}

#[test]
fn lots_json_lists_remaining() {
    let out = stdout(&taxlots(&["lots", &data("mixed_terms.csv"), "--json"]));
    let json: serde_json::Value = serde_json::from_str(&out).expect("Invalid JSON output");
    let lots = json["lots"].as_array().expect("lots array");
    let assets: Vec<&str> = lots.iter().filter_map(|l| l["asset"].as_str()).collect();
    // BTC lots in acquisition order, then ETH
    assert_eq!(assets, vec!["BTC", "BTC", "ETH"]);
}

#[test]
fn import_binance_normalizes() {
    let out = stdout(&taxlots(&["import", "binance", &data("binance.csv")]));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "date,side,asset,quantity,value,description",
            "2021-01-04 10:15:00,Buy,BTC,0.1,3150,Binance Spot Trading",
            "2021-02-20 15:45:00,Sell,BTC,0.05,2800,Binance Spot Trading",
        ]
    );
}

#[test]
fn schema_csv_header() {
    let out = stdout(&taxlots(&["schema", "csv-header"]));
    assert_eq!(out.trim_end(), "date,side,asset,quantity,value,description");
}

#[test]
fn schema_csv_fields_marks_optional() {
    let out = stdout(&taxlots(&["schema"]));
    let description = out
        .lines()
        .find(|l| l.starts_with("description"))
        .expect("description column listed");
    assert!(description.contains("optional"), "{}", description);
    let date = out
        .lines()
        .find(|l| l.starts_with("date"))
        .expect("date column listed");
    assert!(date.contains("required"), "{}", date);
}
