//! End-to-end tests: CSV tables on disk, real TCP sockets.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use taskpool_core::app::{Server, TaskRegistry};
use taskpool_core::config::ServerConfig;
use taskpool_core::domain::Partition;
use taskpool_core::error::{ServerError, StoreError};

const HEADER: &str = "TarefaID,Descricao,Estado,ClienteID";

fn write_partition(dir: &Path, partition: Partition, rows: &[&str]) {
    let mut content = String::from(HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    std::fs::write(dir.join(ServerConfig::default_file_name(partition)), content).unwrap();
}

/// A: 1..=5 with 2 already done, B: 6..=7, C and D empty.
fn seed(dir: &Path) {
    write_partition(
        dir,
        Partition::A,
        &[
            "1,Review contract,Nao alocado,-1",
            "2,Order paper,Concluido,-1",
            "3,Call supplier,Nao alocado,-1",
            "4,Update wiki,Nao alocado,-1",
            "5,Plan sprint,Nao alocado,-1",
        ],
    );
    write_partition(
        dir,
        Partition::B,
        &["6,Backup database,Nao alocado,-1", "7,Rotate keys,Nao alocado,-1"],
    );
    write_partition(dir, Partition::C, &[]);
    write_partition(dir, Partition::D, &[]);
}

fn config(dir: &Path) -> ServerConfig {
    ServerConfig::new("127.0.0.1:0".parse().unwrap(), dir)
}

struct Running {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

async fn start(dir: &Path) -> Running {
    let registry = Arc::new(TaskRegistry::open(&config(dir)).await.unwrap());
    let server = Server::bind("127.0.0.1:0".parse().unwrap(), registry)
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let (shutdown, rx) = watch::channel(false);
    let join = tokio::spawn(server.run(rx));
    Running {
        addr,
        shutdown,
        join,
    }
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> (Self, String) {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        let mut client = Self {
            reader: BufReader::new(reader),
            writer,
        };
        let greeting = client.line().await;
        (client, greeting)
    }

    async fn request(&mut self, command: &str) -> String {
        self.writer
            .write_all(format!("{command}\n").as_bytes())
            .await
            .unwrap();
        self.line().await
    }

    async fn line(&mut self) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("server replied in time")
            .unwrap();
        line.trim_end().to_string()
    }
}

#[tokio::test]
async fn clients_get_distinct_ids_and_tasks() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let server = start(dir.path()).await;

    let (mut first, greeting) = Client::connect(server.addr).await;
    assert_eq!(greeting, "100 OKID:1");
    let (mut second, greeting) = Client::connect(server.addr).await;
    assert_eq!(greeting, "100 OKID:2");

    let a = first.request("NOVA_TAREFA").await;
    let b = second.request("NOVA_TAREFA").await;
    assert_ne!(a, b);
    for reply in [&a, &b] {
        assert!(reply.starts_with("new task assigned successfully: "), "{reply}");
    }

    assert_eq!(first.request("NOVA_TAREFA").await, "you already have an assigned task");
    assert_eq!(first.request("QUIT").await, "400 BYE");
    assert_eq!(second.request("QUIT").await, "400 BYE");

    server.shutdown.send(true).unwrap();
    server.join.await.unwrap();
}

#[tokio::test]
async fn completion_is_written_to_the_partition_file() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let server = start(dir.path()).await;

    let (mut client, _) = Client::connect(server.addr).await;
    assert_eq!(
        client.request("NOVA_TAREFA").await,
        "new task assigned successfully: Review contract"
    );

    let table = std::fs::read_to_string(dir.path().join("Servico_A.csv")).unwrap();
    assert!(table.contains("1,Review contract,Em curso,1"), "{table}");

    assert_eq!(client.request("CONCLUIDA 1").await, "task completed successfully");
    let table = std::fs::read_to_string(dir.path().join("Servico_A.csv")).unwrap();
    assert!(table.contains("1,Review contract,Concluido,-1"), "{table}");
    assert!(table.starts_with(HEADER));

    assert_eq!(client.request("CONCLUIDA 6").await, "task 6 is not in progress");
    assert_eq!(client.request("CONCLUIDA 12").await, "task 12 not found");
    assert_eq!(client.request("CONCLUIDA 21").await, "invalid task id: 21");
    client.request("QUIT").await;

    // the untouched partition file is byte-for-byte what we wrote
    let table_b = std::fs::read_to_string(dir.path().join("Servico_B.csv")).unwrap();
    assert_eq!(
        table_b,
        format!("{HEADER}\n6,Backup database,Nao alocado,-1\n7,Rotate keys,Nao alocado,-1\n")
    );

    server.shutdown.send(true).unwrap();
    server.join.await.unwrap();
}

#[tokio::test]
async fn exhausted_pools_report_none_available() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let server = start(dir.path()).await;

    // 4 unassigned in A, 2 in B
    let mut clients = Vec::new();
    let mut replies = Vec::new();
    for _ in 0..7 {
        let (mut client, _) = Client::connect(server.addr).await;
        replies.push(client.request("NOVA_TAREFA").await);
        clients.push(client);
    }

    assert_eq!(
        &replies[..6],
        [
            "new task assigned successfully: Review contract",
            "new task assigned successfully: Call supplier",
            "new task assigned successfully: Update wiki",
            "new task assigned successfully: Plan sprint",
            "new task assigned successfully: Backup database",
            "new task assigned successfully: Rotate keys",
        ]
    );
    assert_eq!(replies[6], "no tasks available for assignment");

    server.shutdown.send(true).unwrap();
    server.join.await.unwrap();
}

#[tokio::test]
async fn disconnects_do_not_disturb_other_clients_or_reuse_ids() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let server = start(dir.path()).await;

    let (mut stays, _) = Client::connect(server.addr).await;
    let (leaves, greeting) = Client::connect(server.addr).await;
    assert_eq!(greeting, "100 OKID:2");
    drop(leaves);

    let (_, greeting) = Client::connect(server.addr).await;
    assert_eq!(greeting, "100 OKID:3");
    assert!(stays.request("NOVA_TAREFA").await.starts_with("new task assigned"));

    server.shutdown.send(true).unwrap();
    server.join.await.unwrap();
}

#[tokio::test]
async fn malformed_rows_do_not_prevent_startup() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    write_partition(
        dir.path(),
        Partition::A,
        &["1,Fine,Nao alocado,-1", "2,Broken,Nao alocado", "3,Bad owner,Em curso,x"],
    );

    let registry = TaskRegistry::open(&config(dir.path())).await.unwrap();
    let counts = registry.counts().await;
    assert_eq!(counts[&Partition::A].total(), 1);
    assert_eq!(counts[&Partition::B].unassigned, 2);
}

#[tokio::test]
async fn missing_partition_file_aborts_startup() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    std::fs::remove_file(dir.path().join("Servico_C.csv")).unwrap();

    let result = TaskRegistry::open(&config(dir.path())).await;
    assert!(matches!(
        result,
        Err(ServerError::Store(StoreError::Read { .. }))
    ));
}

#[tokio::test]
async fn shutdown_stops_the_accept_loop() {
    let dir = TempDir::new().unwrap();
    seed(dir.path());
    let server = start(dir.path()).await;

    server.shutdown.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), server.join)
        .await
        .expect("accept loop stopped")
        .unwrap();
}
