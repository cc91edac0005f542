use crate::error::Result;
use crate::guard_error;
use crate::model::{OutputInfo, Point, Rect, WindowHandle, WindowKind, WindowKinds};
use tracing::{debug, info, trace};
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ClientMessageEvent, ConfigureWindowAux, ConnectionExt as _, EventMask,
    PropMode, Window,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::r#trait::DisplayBackend;

/// `_NET_WM_STATE_REMOVE` из EWMH
const NET_WM_STATE_REMOVE: u32 = 0;

const MAX_WINDOW_TYPES: u32 = 1024;

#[derive(Debug, Clone)]
struct X11Atoms {
    net_client_list: Atom,
    net_wm_name: Atom,
    net_wm_window_type: Atom,
    net_wm_window_type_dock: Atom,
    net_wm_window_type_desktop: Atom,
    net_wm_state: Atom,
    net_wm_state_maximized_horz: Atom,
    net_wm_state_maximized_vert: Atom,
    net_wm_state_above: Atom,
}

impl X11Atoms {
    fn intern(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            net_client_list: get_atom(conn, b"_NET_CLIENT_LIST")?,
            net_wm_name: get_atom(conn, b"_NET_WM_NAME")?,
            net_wm_window_type: get_atom(conn, b"_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_dock: get_atom(conn, b"_NET_WM_WINDOW_TYPE_DOCK")?,
            net_wm_window_type_desktop: get_atom(conn, b"_NET_WM_WINDOW_TYPE_DESKTOP")?,
            net_wm_state: get_atom(conn, b"_NET_WM_STATE")?,
            net_wm_state_maximized_horz: get_atom(conn, b"_NET_WM_STATE_MAXIMIZED_HORZ")?,
            net_wm_state_maximized_vert: get_atom(conn, b"_NET_WM_STATE_MAXIMIZED_VERT")?,
            net_wm_state_above: get_atom(conn, b"_NET_WM_STATE_ABOVE")?,
        })
    }

    fn window_kind(&self, atom: Atom) -> WindowKind {
        if atom == self.net_wm_window_type_dock {
            WindowKind::Dock
        } else if atom == self.net_wm_window_type_desktop {
            WindowKind::Desktop
        } else {
            WindowKind::Other
        }
    }
}

/// Бэкенд поверх X-сервера: EWMH-свойства окон и RandR для мониторов
pub struct X11Display {
    conn: RustConnection,
    root: Window,
    atoms: X11Atoms,
}

impl X11Display {
    pub fn connect() -> Result<Self> {
        info!("Подключение к X-серверу");

        let (conn, screen_num) = RustConnection::connect(None)?;
        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| guard_error!(internal, "Экран {} не найден", screen_num))?;

        let atoms = X11Atoms::intern(&conn)?;

        let version = conn.randr_query_version(1, 3)?.reply()?;
        info!(
            "Подключено к X-серверу: экран {}, RandR {}.{}",
            screen_num, version.major_version, version.minor_version
        );

        Ok(Self { conn, root, atoms })
    }
}

impl DisplayBackend for X11Display {
    fn outputs(&mut self) -> Result<Option<Vec<OutputInfo>>> {
        let cookie = self.conn.randr_get_screen_resources_current(self.root)?;
        let Some(resources) = transient("screen resources", self.root, cookie.reply())? else {
            return Ok(None);
        };
        let timestamp = resources.config_timestamp;

        let mut outputs = Vec::with_capacity(resources.outputs.len());
        for &output in &resources.outputs {
            let cookie = self.conn.randr_get_output_info(output, timestamp)?;
            // Частичный список сдвинул бы слоты, поэтому весь опрос откладывается
            let Some(info) = transient("output info", output, cookie.reply())? else {
                return Ok(None);
            };

            let connected = info.connection == randr::Connection::CONNECTED;
            let crtc = if connected && info.crtc != x11rb::NONE {
                let cookie = self.conn.randr_get_crtc_info(info.crtc, timestamp)?;
                match transient("crtc info", info.crtc, cookie.reply())? {
                    Some(crtc) => Some(Rect::new(
                        crtc.x.into(),
                        crtc.y.into(),
                        crtc.width.into(),
                        crtc.height.into(),
                    )),
                    None => return Ok(None),
                }
            } else {
                None
            };

            outputs.push(OutputInfo {
                name: String::from_utf8_lossy(&info.name).into_owned(),
                connected,
                crtc,
            });
        }

        Ok(Some(outputs))
    }

    fn client_list(&mut self) -> Result<Option<Vec<WindowHandle>>> {
        let cookie = self.conn.get_property(
            false,
            self.root,
            self.atoms.net_client_list,
            AtomEnum::WINDOW,
            0,
            u32::MAX,
        )?;

        Ok(transient("_NET_CLIENT_LIST", self.root, cookie.reply())?
            .and_then(|reply| reply.value32().map(Iterator::collect)))
    }

    fn window_title(&mut self, window: WindowHandle) -> Result<Option<String>> {
        let cookie = self.conn.get_property(
            false,
            window,
            self.atoms.net_wm_name,
            AtomEnum::ANY,
            0,
            u32::MAX,
        )?;

        Ok(transient("_NET_WM_NAME", window, cookie.reply())?
            .and_then(|reply| decode_title(reply.type_, &reply.value)))
    }

    fn window_geometry(&mut self, window: WindowHandle) -> Result<Option<Rect>> {
        let cookie = self.conn.get_geometry(window)?;
        let Some(geometry) = transient("geometry", window, cookie.reply())? else {
            return Ok(None);
        };

        let cookie = self.conn.translate_coordinates(window, self.root, 0, 0)?;
        let Some(origin) = transient("translate coordinates", window, cookie.reply())? else {
            return Ok(None);
        };

        Ok(Some(Rect::new(
            origin.dst_x.into(),
            origin.dst_y.into(),
            geometry.width.into(),
            geometry.height.into(),
        )))
    }

    fn window_kinds(&mut self, window: WindowHandle) -> Result<Option<WindowKinds>> {
        let cookie = self.conn.get_property(
            false,
            window,
            self.atoms.net_wm_window_type,
            AtomEnum::ATOM,
            0,
            MAX_WINDOW_TYPES,
        )?;

        let atoms = &self.atoms;
        Ok(transient("_NET_WM_WINDOW_TYPE", window, cookie.reply())?
            .and_then(|reply| {
                reply
                    .value32()
                    .map(|types| types.map(|atom| atoms.window_kind(atom)).collect())
            }))
    }

    fn unmaximize(&mut self, window: WindowHandle) -> Result<()> {
        let event = ClientMessageEvent::new(
            32,
            window,
            self.atoms.net_wm_state,
            [
                NET_WM_STATE_REMOVE,
                self.atoms.net_wm_state_maximized_horz,
                self.atoms.net_wm_state_maximized_vert,
                0,
                0,
            ],
        );

        self.conn.send_event(
            false,
            self.root,
            EventMask::SUBSTRUCTURE_REDIRECT | EventMask::SUBSTRUCTURE_NOTIFY,
            event,
        )?
        .ignore_error();
        Ok(())
    }

    fn move_window(&mut self, window: WindowHandle, position: Point) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().x(position.x).y(position.y))?
            .ignore_error();
        Ok(())
    }

    fn set_always_on_top(&mut self, window: WindowHandle) -> Result<()> {
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.net_wm_state,
            AtomEnum::ATOM,
            &[self.atoms.net_wm_state_above],
        )?
        .ignore_error();
        Ok(())
    }

    fn pointer_position(&mut self) -> Result<Option<Point>> {
        let cookie = self.conn.query_pointer(self.root)?;
        Ok(transient("query pointer", self.root, cookie.reply())?
            .map(|reply| Point::new(reply.root_x.into(), reply.root_y.into())))
    }

    fn warp_pointer(&mut self, position: Point) -> Result<()> {
        self.conn.warp_pointer(
            x11rb::NONE,
            self.root,
            0,
            0,
            0,
            0,
            to_i16(position.x),
            to_i16(position.y),
        )?
        .ignore_error();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.conn.flush()?;
        Ok(())
    }
}

impl Drop for X11Display {
    fn drop(&mut self) {
        debug!("Закрытие соединения с X-сервером");
    }
}

fn get_atom(conn: &RustConnection, name: &[u8]) -> Result<Atom> {
    Ok(conn.intern_atom(false, name)?.reply()?.atom)
}

/// Ошибка протокола X11 делает значение временно недоступным;
/// разрыв соединения пробрасывается как фатальный.
fn transient<T>(
    what: &str,
    resource: u32,
    reply: std::result::Result<T, ReplyError>,
) -> Result<Option<T>> {
    match reply {
        Ok(value) => Ok(Some(value)),
        Err(ReplyError::X11Error(e)) => {
            trace!("{} для 0x{:08x} недоступно: {:?}", what, resource, e.error_kind);
            Ok(None)
        }
        Err(ReplyError::ConnectionError(e)) => Err(e.into()),
    }
}

/// Заголовок читается целиком: искомая подстрока может стоять в конце
/// длинного заголовка. Тип `NONE` означает, что свойства нет.
fn decode_title(type_: Atom, value: &[u8]) -> Option<String> {
    (type_ != u32::from(AtomEnum::NONE)).then(|| String::from_utf8_lossy(value).into_owned())
}

fn to_i16(value: i32) -> i16 {
    value.clamp(i16::MIN.into(), i16::MAX.into()) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_title_is_decoded_whole() {
        let title = format!("{} Ticket Info", "Ж".repeat(3000));
        assert!(title.len() > 4096);

        let decoded = decode_title(u32::from(AtomEnum::STRING), title.as_bytes()).unwrap();
        assert_eq!(decoded.len(), title.len());
        assert!(decoded.ends_with("Ticket Info"));
    }

    #[test]
    fn test_missing_title_property() {
        assert_eq!(decode_title(u32::from(AtomEnum::NONE), b""), None);
        assert_eq!(decode_title(u32::from(AtomEnum::STRING), b""), Some(String::new()));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let decoded = decode_title(u32::from(AtomEnum::STRING), b"Ticket \xff Info").unwrap();
        assert_eq!(decoded, "Ticket \u{fffd} Info");
    }

    #[test]
    fn test_pointer_coordinates_saturate() {
        assert_eq!(to_i16(1918), 1918);
        assert_eq!(to_i16(100_000), i16::MAX);
        assert_eq!(to_i16(-100_000), i16::MIN);
    }
}
