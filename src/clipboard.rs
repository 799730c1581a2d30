use anyhow::Context;

/// Puts `text` on the system clipboard.
pub fn copy_to_clipboard(text: &str) -> anyhow::Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("System clipboard is unavailable")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to write to the clipboard")?;
    log::info!("Copied {} characters to the clipboard", text.chars().count());
    Ok(())
}
