use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Не удалось подключиться к X-серверу: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("Соединение с X-сервером потеряно: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("Ошибка ответа X-сервера: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, GuardError>;

// Удобный макрос для создания ошибок
#[macro_export]
macro_rules! guard_error {
    (internal, $($arg:tt)*) => {
        $crate::error::GuardError::Internal(format!($($arg)*))
    };
}
