// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use sq_adapters::PeerChannel;
use tempfile::TempDir;

fn write_config(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("worker.toml");
    std::fs::write(&path, text).unwrap();
    path
}

/// Address nothing listens on
async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

#[test]
fn config_file_carries_worker_and_process_options() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
group = "reports"
bucket_count = 8
iteration_length = "30s"
servers = ["10.0.0.2:11211"]
exec = "./process.sh"
log_file = "/var/log/sqd.log"
"#,
    );

    let config = Config::load(&path, Overrides::default()).unwrap();

    assert_eq!(config.worker.group.name(), "reports");
    assert_eq!(config.worker.bucket_count, 8);
    assert_eq!(config.worker.iteration_length, Duration::from_secs(30));
    assert_eq!(config.worker.servers, vec!["10.0.0.2:11211".to_string()]);
    assert_eq!(config.exec.as_deref(), Some("./process.sh"));
    assert_eq!(config.log_file, Some(PathBuf::from("/var/log/sqd.log")));
}

#[test]
fn command_line_overrides_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "group = \"reports\"\nbucket_count = 8\n");

    let overrides = Overrides {
        group: Some("billing".into()),
        bucket_count: Some(4),
        iteration_length: Some(Duration::from_secs(5)),
        dictatorship_length: Some(Duration::from_secs(120)),
        servers: vec!["cache:11211".into()],
        hostname: Some("worker-1".into()),
        port: Some(4100),
        exec: Some("true".into()),
        log_file: None,
    };
    let config = Config::load(&path, overrides).unwrap();

    assert_eq!(config.worker.group.name(), "billing");
    assert_eq!(config.worker.bucket_count, 4);
    assert_eq!(config.worker.iteration_length, Duration::from_secs(5));
    assert_eq!(config.worker.dictatorship_length(), Duration::from_secs(120));
    assert_eq!(config.worker.servers, vec!["cache:11211".to_string()]);
    assert_eq!(config.worker.hostname.as_deref(), Some("worker-1"));
    assert_eq!(config.worker.port, 4100);
    assert_eq!(config.exec.as_deref(), Some("true"));
    assert_eq!(config.log_file, None);
}

#[test]
fn durations_parse_from_the_command_line() {
    #[derive(clap::Parser)]
    struct Args {
        #[command(flatten)]
        overrides: Overrides,
    }

    let args = <Args as clap::Parser>::try_parse_from([
        "sqd",
        "--iteration-length",
        "30s",
        "--dictatorship-length",
        "5m",
    ])
    .unwrap();

    assert_eq!(args.overrides.iteration_length, Some(Duration::from_secs(30)));
    assert_eq!(args.overrides.dictatorship_length, Some(Duration::from_secs(300)));
}

#[test]
fn overrides_are_validated() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "group = \"reports\"\nbucket_count = 8\n");

    let overrides = Overrides {
        bucket_count: Some(0),
        ..Default::default()
    };
    let err = Config::load(&path, overrides).unwrap_err();
    assert!(matches!(err, LifecycleError::Config(ConfigError::NoBuckets)));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let err = Config::load(&dir.path().join("absent.toml"), Overrides::default()).unwrap_err();
    assert!(matches!(err, LifecycleError::Config(ConfigError::Read { .. })));
}

#[tokio::test]
async fn startup_serves_the_worker_on_its_advertised_uri() {
    let config = Config {
        worker: WorkerConfig::new("reports", 4).with_servers(vec![closed_port().await]),
        exec: None,
        log_file: None,
    };

    let daemon = startup(&config).await.unwrap();
    let uri = daemon.worker.uri().clone();

    assert!(uri.as_str().starts_with("127.0.0.1:"));
    assert!(TcpPeerChannel::new().probe_alive(&uri).await.unwrap());

    daemon.shutdown().await;
    assert!(TcpPeerChannel::new().probe_alive(&uri).await.is_err());
}

#[tokio::test]
async fn startup_fails_when_the_port_is_taken() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();
    let config = Config {
        worker: WorkerConfig::new("reports", 4)
            .with_hostname("127.0.0.1")
            .with_servers(vec![closed_port().await]),
        exec: None,
        log_file: None,
    };
    let config = Config {
        worker: WorkerConfig {
            port,
            ..config.worker
        },
        ..config
    };

    let err = startup(&config).await.err().unwrap();
    assert!(matches!(err, LifecycleError::BindFailed(..)));
}
