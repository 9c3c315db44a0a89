//! HTML body of the license email.

/// Render the license email.
///
/// The token is placed verbatim inside a `<code>` block. Tokens only contain
/// the base64 alphabet and `.`, none of which HTML treats specially, so the
/// user copies back exactly the bytes that were signed.
pub fn license_email_html(token: &str) -> String {
    format!(
        r#"<div style="font-family: system-ui, sans-serif; max-width: 560px; margin: 0 auto; padding: 32px 16px;">
  <h1 style="font-size: 20px; margin-bottom: 8px;">Thank you for supporting MarkRight!</h1>
  <p style="color: #555; margin-bottom: 24px;">Your Pro license key is below. It unlocks cross-file search and every future Pro feature.</p>

  <div style="background: #f5f5f5; border: 1px solid #ddd; border-radius: 8px; padding: 16px; margin-bottom: 24px;">
    <p style="font-size: 12px; color: #888; margin: 0 0 8px;">License Key</p>
    <code style="font-family: ui-monospace, monospace; font-size: 11px; word-break: break-all; display: block; line-height: 1.4;">{token}</code>
  </div>

  <h2 style="font-size: 16px; margin-bottom: 12px;">Activating</h2>
  <ol style="color: #555; padding-left: 20px; line-height: 1.8;">
    <li>Open MarkRight and go to <strong>Settings</strong> (gear icon or Ctrl+,)</li>
    <li>Scroll to the <strong>License</strong> section</li>
    <li>Paste the key and click <strong>Activate</strong></li>
  </ol>

  <p style="color: #999; font-size: 12px; margin-top: 24px;">
    You can also save the key as <code>license.key</code> in the config directory:<br/>
    Linux: <code>~/.config/markright/license.key</code><br/>
    macOS: <code>~/Library/Application Support/markright/license.key</code><br/>
    Windows: <code>%APPDATA%\markright\license.key</code>
  </p>
</div>"#
    )
}
