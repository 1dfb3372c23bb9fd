use qrcode::QrCode;

use crate::error::{Error, Result};

/**
 * @brief Render text as a terminal-displayable QR code.
 *
 * Best-effort: a failure here never invalidates the config file the text
 * came from, callers log and move on.
 */
pub fn render(text: &str) -> Result<String> {
    let code = QrCode::new(text.as_bytes()).map_err(|e| Error::ExternalCommandFailure {
        command: "qr render".into(),
        reason: e.to_string(),
    })?;
    Ok(code
        .render::<char>()
        .quiet_zone(false)
        .module_dimensions(2, 1)
        .build())
}
