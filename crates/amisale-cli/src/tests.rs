use std::path::PathBuf;

use super::*;

fn sample_config() -> amisale_core::CrawlConfig {
    amisale_core::CrawlConfig {
        listing_url: amisale_core::app_config::DEFAULT_LISTING_URL.to_owned(),
        page_param: "pagecnt".to_owned(),
        webdriver_url: "http://localhost:9515".to_owned(),
        headless: true,
        max_attempts: 3,
        retry_delay_min_ms: 2_000,
        retry_delay_max_ms: 6_000,
        inter_page_delay_min_ms: 1_000,
        inter_page_delay_max_ms: 3_000,
        page_load_timeout_secs: 20,
        scroll_to_bottom: true,
        max_pages: 200,
        dedupe_links: false,
        output_dir: PathBuf::from("."),
        log_level: "info".to_owned(),
    }
}

#[test]
fn parses_bare_crawl_command() {
    let cli = Cli::try_parse_from(["amisale", "crawl"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Crawl(CrawlArgs {
            max_pages: None,
            output_dir: None,
            dedupe: false,
            no_xlsx: false,
            preview: false,
        })
    ));
}

#[test]
fn parses_crawl_flags() {
    let cli = Cli::try_parse_from([
        "amisale",
        "crawl",
        "--max-pages",
        "5",
        "--output-dir",
        "out",
        "--dedupe",
        "--no-xlsx",
        "--preview",
    ])
    .expect("expected valid cli args");

    let Commands::Crawl(args) = cli.command else {
        panic!("expected crawl command");
    };
    assert_eq!(args.max_pages, Some(5));
    assert_eq!(args.output_dir, Some(PathBuf::from("out")));
    assert!(args.dedupe && args.no_xlsx && args.preview);
}

#[test]
fn parses_config_command() {
    let cli = Cli::try_parse_from(["amisale", "config"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Config));
}

#[test]
fn missing_command_is_an_error() {
    assert!(Cli::try_parse_from(["amisale"]).is_err());
}

#[test]
fn rejects_non_numeric_max_pages() {
    assert!(Cli::try_parse_from(["amisale", "crawl", "--max-pages", "all"]).is_err());
}

#[test]
fn crawl_flags_override_config() {
    let cli = Cli::try_parse_from(["amisale", "crawl", "--max-pages", "3", "--output-dir", "/tmp/sales", "--dedupe"])
        .expect("expected valid cli args");
    let Commands::Crawl(args) = cli.command else {
        panic!("expected crawl command");
    };

    let mut config = sample_config();
    args.apply(&mut config).unwrap();

    assert_eq!(config.max_pages, 3);
    assert_eq!(config.output_dir, PathBuf::from("/tmp/sales"));
    assert!(config.dedupe_links);
}

#[test]
fn absent_flags_keep_config() {
    let cli = Cli::try_parse_from(["amisale", "crawl"]).expect("expected valid cli args");
    let Commands::Crawl(args) = cli.command else {
        panic!("expected crawl command");
    };

    let mut config = sample_config();
    config.dedupe_links = true;
    args.apply(&mut config).unwrap();

    assert_eq!(config.max_pages, 200);
    assert_eq!(config.output_dir, PathBuf::from("."));
    assert!(config.dedupe_links, "--dedupe absent must not turn dedupe off");
}

#[test]
fn zero_max_pages_is_rejected() {
    let cli = Cli::try_parse_from(["amisale", "crawl", "--max-pages", "0"]).expect("expected valid cli args");
    let Commands::Crawl(args) = cli.command else {
        panic!("expected crawl command");
    };
    let mut config = sample_config();
    assert!(args.apply(&mut config).is_err());
}
