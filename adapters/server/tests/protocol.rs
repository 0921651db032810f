use std::time::Duration;

use roomba_core::{ControlMode, IntervalRange, Tuning, WorldSnapshot};
use roomba_server::serve;
use roomba_session::{Session, SessionConfig};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines},
    net::{tcp::OwnedReadHalf, tcp::OwnedWriteHalf, TcpListener, TcpStream},
    sync::oneshot,
    task::JoinHandle,
    time::timeout,
};

const HOUR: Duration = Duration::from_secs(3_600);

struct Harness {
    session: Session,
    addr: std::net::SocketAddr,
    stop: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl Harness {
    async fn start(mode: ControlMode) -> Self {
        let tuning = Tuning {
            particle_spawn_interval: IntervalRange::new(HOUR, HOUR),
            threat_spawn_interval: IntervalRange::new(HOUR, HOUR),
            hazard_interval: HOUR,
            ..Tuning::default()
        };
        let session = Session::start(SessionConfig {
            tuning,
            mode,
            ..SessionConfig::default()
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, session.store().clone(), async move {
            let _ = stopped.await;
        }));

        Self {
            session,
            addr,
            stop,
            server,
        }
    }

    async fn connect(&self) -> Client {
        let stream = TcpStream::connect(self.addr).await.expect("connect");
        let (reader, writer) = stream.into_split();
        Client {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn stop(self) {
        let _ = self.stop.send(());
        timeout(Duration::from_secs(1), self.server)
            .await
            .expect("server stops")
            .expect("server task");
        self.session.shutdown().await;
    }
}

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write");
    }

    async fn send_bytes(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("write");
    }

    async fn receive(&mut self) -> Option<String> {
        self.receive_within(Duration::from_secs(2)).await
    }

    async fn receive_within(&mut self, limit: Duration) -> Option<String> {
        timeout(limit, self.lines.next_line())
            .await
            .expect("reply in time")
            .expect("read")
    }

    async fn request(&mut self, line: &str) -> String {
        self.send(line).await;
        self.receive().await.expect("reply")
    }

    async fn state(&mut self, line: &str) -> WorldSnapshot {
        serde_json::from_str(&self.request(line).await).expect("snapshot")
    }
}

#[tokio::test]
async fn get_state_returns_snapshot() {
    let harness = Harness::start(ControlMode::Manual).await;
    let mut client = harness.connect().await;

    let snapshot = client.state(r#"{"cmd":"GET_STATE"}"#).await;

    assert_eq!((snapshot.x, snapshot.y), (200.0, 180.0));
    assert_eq!(snapshot.lives, 3);
    assert_eq!(snapshot.control_mode, ControlMode::Manual);
    assert!(!snapshot.terminal);
    harness.stop().await;
}

#[tokio::test]
async fn move_steps_robot_in_manual_mode() {
    let harness = Harness::start(ControlMode::Manual).await;
    let mut client = harness.connect().await;

    let snapshot = client.state(r#"{"cmd":"MOVE","direction":"RIGHT"}"#).await;
    assert_eq!((snapshot.x, snapshot.y), (205.0, 180.0));

    let snapshot = client.state(r#"{"cmd":"MOVE","direction":"UP"}"#).await;
    assert_eq!((snapshot.x, snapshot.y), (205.0, 175.0));
    harness.stop().await;
}

#[tokio::test]
async fn move_is_refused_in_auto_mode() {
    let harness = Harness::start(ControlMode::Auto).await;
    let mut client = harness.connect().await;

    let snapshot = client.state(r#"{"cmd":"MOVE","direction":"RIGHT"}"#).await;

    assert_eq!((snapshot.x, snapshot.y), (200.0, 180.0));
    assert_eq!(snapshot.control_mode, ControlMode::Auto);
    harness.stop().await;
}

#[tokio::test]
async fn set_mode_switches_controller() {
    let harness = Harness::start(ControlMode::Auto).await;
    let mut client = harness.connect().await;

    let snapshot = client.state(r#"{"cmd":"SET_MODE","mode":"manual"}"#).await;
    assert_eq!(snapshot.control_mode, ControlMode::Manual);

    let snapshot = client.state(r#"{"cmd":"MOVE","direction":"DOWN"}"#).await;
    assert_eq!((snapshot.x, snapshot.y), (200.0, 185.0));
    harness.stop().await;
}

#[tokio::test]
async fn check_prime_answers_with_verdict() {
    let harness = Harness::start(ControlMode::Manual).await;
    let mut client = harness.connect().await;

    let verdict = client.request(r#"{"cmd":"CHECK_PRIME","number":"13"}"#).await;
    assert_eq!(verdict, r#""13 is prime.""#);

    let verdict = client.request(r#"{"cmd":"CHECK_PRIME","numero":"15"}"#).await;
    assert_eq!(verdict, r#""15 is not prime.""#);

    let verdict = client.request(r#"{"cmd":"CHECK_PRIME","number":"abc"}"#).await;
    assert_eq!(verdict, r#""Error: input is not an integer.""#);
    harness.stop().await;
}

#[tokio::test]
async fn garbage_is_ignored_and_connection_stays_open() {
    let harness = Harness::start(ControlMode::Manual).await;
    let mut client = harness.connect().await;

    client.send("this is not json").await;
    client.send(r#"{"cmd":"LAUNCH"}"#).await;
    let snapshot = client.state(r#"{"cmd":"GET_STATE"}"#).await;

    assert_eq!(snapshot.score, 0);
    harness.stop().await;
}

#[tokio::test]
async fn invalid_utf8_line_is_ignored() {
    let harness = Harness::start(ControlMode::Manual).await;
    let mut client = harness.connect().await;

    client.send_bytes(b"\xff\xfe garbage\n").await;
    let snapshot = client.state(r#"{"cmd":"GET_STATE"}"#).await;

    assert_eq!(snapshot.lives, 3);
    harness.stop().await;
}

#[tokio::test]
async fn oversized_line_is_discarded_and_connection_stays_open() {
    let harness = Harness::start(ControlMode::Manual).await;
    let mut client = harness.connect().await;

    let mut huge = vec![b'x'; roomba_server::protocol::MAX_FRAME_LEN + 4_096];
    huge.push(b'\n');
    client.send_bytes(&huge).await;
    let snapshot = client.state(r#"{"cmd":"MOVE","direction":"UP"}"#).await;

    assert_eq!((snapshot.x, snapshot.y), (200.0, 175.0));
    harness.stop().await;
}

#[tokio::test]
async fn slow_prime_check_does_not_stall_other_clients() {
    let harness = Harness::start(ControlMode::Manual).await;
    let mut checker = harness.connect().await;
    let mut observer = harness.connect().await;

    checker
        .send(r#"{"cmd":"CHECK_PRIME","number":"2305843009213693951"}"#)
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    observer
        .send(r#"{"cmd":"MOVE","direction":"LEFT"}"#)
        .await;
    let reply = observer
        .receive_within(Duration::from_millis(500))
        .await
        .expect("reply");
    let snapshot: WorldSnapshot = serde_json::from_str(&reply).expect("snapshot");
    assert_eq!((snapshot.x, snapshot.y), (195.0, 180.0));

    let verdict = checker
        .receive_within(Duration::from_secs(120))
        .await
        .expect("verdict");
    assert_eq!(verdict, r#""2305843009213693951 is prime.""#);
    harness.stop().await;
}

#[tokio::test]
async fn exit_closes_only_that_connection() {
    let harness = Harness::start(ControlMode::Manual).await;
    let mut leaving = harness.connect().await;
    let mut staying = harness.connect().await;

    leaving.send(r#"{"cmd":"EXIT"}"#).await;
    assert_eq!(leaving.receive().await, None);

    let snapshot = staying.state(r#"{"cmd":"GET_STATE"}"#).await;
    assert_eq!(snapshot.lives, 3);
    harness.stop().await;
}

#[tokio::test]
async fn abrupt_disconnect_does_not_affect_other_clients() {
    let harness = Harness::start(ControlMode::Manual).await;
    let dropped = harness.connect().await;
    drop(dropped);
    let mut client = harness.connect().await;

    let snapshot = client.state(r#"{"cmd":"MOVE","direction":"LEFT"}"#).await;

    assert_eq!((snapshot.x, snapshot.y), (195.0, 180.0));
    harness.stop().await;
}
