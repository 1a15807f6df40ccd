//! # Tokio Transport
//!
//! Carries MBAP frames between TCP peers and a [`ModbusSlave`], and drives
//! the panel on its own timers.
//!
//! Frames are cut from the byte stream by their length field: a 6-byte
//! prefix, then `length` bytes (unit id + PDU). The whole frame is handed
//! to the slave, which validates it as if it had arrived in one delivery.
//! A length field above 254 cannot be resynchronized and closes the
//! connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::button::{ButtonDebouncer, ButtonSource};
use crate::config::SlaveConfig;
use crate::constants::{MAX_FRAME_LEN, MAX_MBAP_LENGTH, MBAP_HEADER_LEN};
use crate::display::{DisplayRenderer, DisplaySelectionPresenter};
use crate::error::{ModbusError, ModbusResult};
use crate::register_bank::RegisterBank;
use crate::slave::{BufferSink, FrameDisposition, ModbusSlave};

/// Modbus TCP listener serving one slave
pub struct TcpSlaveServer {
    listener: TcpListener,
    slave: Arc<ModbusSlave>,
    send_capacity: usize,
}

impl TcpSlaveServer {
    /// Bind to `config.bind_address`
    pub async fn bind(config: &SlaveConfig, slave: Arc<ModbusSlave>) -> ModbusResult<Self> {
        config.validate()?;
        let listener = TcpListener::bind(&config.bind_address).await?;
        info!(
            "Modbus slave listening on {} (unit {})",
            listener.local_addr()?,
            slave.unit_id()
        );
        Ok(Self::from_listener(listener, slave, config.send_capacity))
    }

    pub fn from_listener(listener: TcpListener, slave: Arc<ModbusSlave>, send_capacity: usize) -> Self {
        Self {
            listener,
            slave,
            send_capacity,
        }
    }

    pub fn local_addr(&self) -> ModbusResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener fails
    pub async fn run(self) -> ModbusResult<()> {
        loop {
            let (socket, peer) = self.listener.accept().await?;
            info!("Client connected: {}", peer);
            let slave = Arc::clone(&self.slave);
            let send_capacity = self.send_capacity;

            tokio::spawn(async move {
                match serve_connection(socket, &slave, send_capacity).await {
                    Ok(()) => info!("Client disconnected: {}", peer),
                    Err(e) => warn!("Connection {} ended with error: {}", peer, e),
                }
            });
        }
    }
}

/// Serve one connection until the peer closes it
pub async fn serve_connection<S>(mut stream: S, slave: &ModbusSlave, send_capacity: usize) -> ModbusResult<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut frame = [0u8; MAX_FRAME_LEN];
    let mut sink = BufferSink::new(send_capacity);

    loop {
        match stream.read_exact(&mut frame[..MBAP_HEADER_LEN]).await {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let length = u16::from_be_bytes([frame[4], frame[5]]) as usize;
        if length == 0 || length > MAX_MBAP_LENGTH {
            return Err(ModbusError::protocol(format!(
                "invalid MBAP length {}, closing connection",
                length
            )));
        }

        let total = MBAP_HEADER_LEN + length;
        stream.read_exact(&mut frame[MBAP_HEADER_LEN..total]).await?;

        match slave.on_frame(&frame[..total], &mut sink) {
            FrameDisposition::Replied(_) => {
                stream.write_all(&sink.take()).await?;
                stream.flush().await?;
            }
            disposition => debug!("No reply sent: {:?}", disposition),
        }
    }
}

/// Button polling and display refresh for one panel
pub struct PanelLoop<B, R> {
    bank: Arc<RegisterBank>,
    presenter: DisplaySelectionPresenter,
    debouncer: ButtonDebouncer,
    buttons: B,
    renderer: R,
}

impl<B: ButtonSource, R: DisplayRenderer> PanelLoop<B, R> {
    pub fn new(bank: Arc<RegisterBank>, buttons: B, renderer: R) -> Self {
        Self {
            bank,
            presenter: DisplaySelectionPresenter::new(),
            debouncer: ButtonDebouncer::new(),
            buttons,
            renderer,
        }
    }

    pub fn presenter(&self) -> &DisplaySelectionPresenter {
        &self.presenter
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Sample the buttons once; returns `true` if the selection changed
    pub fn poll_buttons(&mut self) -> bool {
        let reading = self.buttons.read_buttons();
        match self.debouncer.poll(reading) {
            Some(mask) => self.presenter.on_buttons(mask),
            None => false,
        }
    }

    /// Draw the current selection
    pub fn refresh(&mut self) {
        self.presenter.render(&self.bank, &mut self.renderer);
    }

    /// Run both timers until `shutdown` completes
    pub async fn run<F: Future<Output = ()>>(mut self, config: &SlaveConfig, shutdown: F) {
        let mut button_tick = interval(config.button_poll_interval);
        let mut display_tick = interval(config.display_refresh_interval);
        button_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        display_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Panel loop stopped");
                    return;
                }
                _ = button_tick.tick() => {
                    self.poll_buttons();
                }
                _ = display_tick.tick() => {
                    self.refresh();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdu::PduBuilder;
    use std::time::Duration;

    fn write_request(txn: u16, unit: u8, start: u16, values: &[u16]) -> Vec<u8> {
        let pdu = PduBuilder::build_write_multiple_registers(start, values).unwrap();
        let mut buf = Vec::new();
        buf.extend_from_slice(&txn.to_be_bytes());
        buf.extend_from_slice(&[0, 0]);
        buf.extend_from_slice(&((pdu.len() + 1) as u16).to_be_bytes());
        buf.push(unit);
        buf.extend_from_slice(pdu.as_slice());
        buf
    }

    #[derive(Default)]
    struct Recorder {
        rendered: Vec<(u16, u16)>,
    }

    impl DisplayRenderer for Recorder {
        fn render(&mut self, value_a: u16, value_b: u16, _align_right: bool) {
            self.rendered.push((value_a, value_b));
        }

        fn highlight(&mut self, _slot_a: u8, _slot_b: u8) {}
    }

    #[tokio::test]
    async fn test_connection_write_and_reply() {
        let slave = ModbusSlave::new(1, Arc::new(RegisterBank::new()));
        let stream = tokio_test::io::Builder::new()
            .read(&write_request(0x0001, 1, 0x0010, &[5, 900]))
            .write(&[0x00, 0x01, 0, 0, 0, 6, 1, 0x10, 0x00, 0x10, 0x00, 0x02])
            .build();

        serve_connection(stream, &slave, MAX_FRAME_LEN).await.unwrap();
        assert_eq!(slave.bank().snapshot()[..2], [5, 900]);
    }

    #[tokio::test]
    async fn test_connection_foreign_unit_then_exception() {
        let slave = ModbusSlave::new(1, Arc::new(RegisterBank::new()));
        // First frame is for unit 2 and gets no reply; second overruns the bank
        let stream = tokio_test::io::Builder::new()
            .read(&write_request(1, 2, 0x0010, &[1]))
            .read(&write_request(2, 1, 0x0017, &[1, 2]))
            .write(&[0x00, 0x02, 0, 0, 0, 3, 1, 0x90, 0x02])
            .build();

        serve_connection(stream, &slave, MAX_FRAME_LEN).await.unwrap();
        assert_eq!(slave.bank().snapshot(), [0; 8]);
        assert_eq!(slave.stats().frames_dropped, 1);
    }

    #[tokio::test]
    async fn test_connection_rejects_oversize_length() {
        let slave = ModbusSlave::new(1, Arc::new(RegisterBank::new()));
        let stream = tokio_test::io::Builder::new()
            .read(&[0, 1, 0, 0, 0x01, 0x00])
            .build();

        let err = serve_connection(stream, &slave, MAX_FRAME_LEN)
            .await
            .unwrap_err();
        assert!(matches!(err, ModbusError::Protocol { .. }));
    }

    #[tokio::test]
    async fn test_tcp_server_roundtrip() {
        let slave = Arc::new(ModbusSlave::new(1, Arc::new(RegisterBank::new())));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = TcpSlaveServer::from_listener(listener, Arc::clone(&slave), MAX_FRAME_LEN);
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let mut client = tokio::net::TcpStream::connect(addr).await.unwrap();
        client
            .write_all(&write_request(0x0042, 1, 0x0013, &[321]))
            .await
            .unwrap();

        let mut reply = [0u8; 12];
        client.read_exact(&mut reply).await.unwrap();
        assert_eq!(reply, [0x00, 0x42, 0, 0, 0, 6, 1, 0x10, 0x00, 0x13, 0x00, 0x01]);
        assert_eq!(slave.bank().read(0x0013).unwrap(), 321);
    }

    #[test]
    fn test_panel_poll_and_refresh() {
        let bank = Arc::new(RegisterBank::new());
        bank.write_block(0x0010, &[10, 11, 12, 13]).unwrap();

        // Button 3 bounces once, then is held
        let mut readings = vec![0b1000u8, 0, 0b1000, 0b1000, 0b1000].into_iter();
        let buttons = move || readings.next().unwrap_or(0b1000);
        let mut panel = PanelLoop::new(Arc::clone(&bank), buttons, Recorder::default());

        let changes: Vec<bool> = (0..5).map(|_| panel.poll_buttons()).collect();
        assert_eq!(changes, vec![false, false, false, true, false]);
        assert_eq!(panel.presenter().selection().primary, 3);
        assert_eq!(panel.presenter().selection().secondary, 0);

        panel.refresh();
        assert_eq!(panel.renderer().rendered, vec![(10, 13)]);
    }

    #[tokio::test]
    async fn test_panel_run_stops_on_shutdown() {
        let bank = Arc::new(RegisterBank::new());
        let panel = PanelLoop::new(bank, || 0u8, Recorder::default());
        let config = SlaveConfig::new()
            .with_button_poll_interval(Duration::from_millis(5))
            .with_display_refresh_interval(Duration::from_millis(5));

        tokio::time::timeout(
            Duration::from_secs(2),
            panel.run(&config, tokio::time::sleep(Duration::from_millis(30))),
        )
        .await
        .unwrap();
    }
}
