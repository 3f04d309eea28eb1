//! Communication channel and opt-out reason catalogs.
//!
//! These must match the values stored in the `channel` and `reason` fields of
//! phone mappings and opt-in history records.

use serde::Serialize;

use crate::error::CoreError;

/// WhatsApp conversational bot.
pub const CHANNEL_WHATSAPP: &str = "whatsapp";

/// Citizen web portal.
pub const CHANNEL_WEB: &str = "web";

/// Mobile application.
pub const CHANNEL_MOBILE: &str = "mobile";

pub const OPT_OUT_IRRELEVANT_CONTENT: &str = "irrelevant_content";
pub const OPT_OUT_NOT_FROM_RIO: &str = "not_from_rio";
pub const OPT_OUT_INCORRECT_PERSON: &str = "incorrect_person";
pub const OPT_OUT_TOO_MANY_MESSAGES: &str = "too_many_messages";

/// Reason recorded in history when an admin or citizen rejects a
/// registration. Not selectable by citizens.
pub const REASON_REGISTRATION_REJECTED: &str = "registration_rejected";

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChannelInfo {
    pub code: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct OptOutReason {
    pub code: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
}

pub const CHANNELS: &[ChannelInfo] = &[
    ChannelInfo { code: CHANNEL_WHATSAPP, name: "WhatsApp Bot" },
    ChannelInfo { code: CHANNEL_WEB, name: "Web Application" },
    ChannelInfo { code: CHANNEL_MOBILE, name: "Mobile App" },
];

pub const OPT_OUT_REASONS: &[OptOutReason] = &[
    OptOutReason {
        code: OPT_OUT_IRRELEVANT_CONTENT,
        title: "Conteúdo irrelevante",
        subtitle: "As mensagens não são úteis para mim.",
    },
    OptOutReason {
        code: OPT_OUT_NOT_FROM_RIO,
        title: "Não sou do Rio",
        subtitle: "Não moro na cidade do Rio de Janeiro",
    },
    OptOutReason {
        code: OPT_OUT_INCORRECT_PERSON,
        title: "Mensagem era engano",
        subtitle: "Não sou a pessoa da mensagem",
    },
    OptOutReason {
        code: OPT_OUT_TOO_MANY_MESSAGES,
        title: "Quantidade de mensagens",
        subtitle: "A Prefeitura está me enviando muitas mensagens",
    },
];

/// Validate a channel code against [`CHANNELS`].
pub fn validate_channel(channel: &str) -> Result<(), CoreError> {
    if CHANNELS.iter().any(|c| c.code == channel) {
        Ok(())
    } else {
        let valid: Vec<&str> = CHANNELS.iter().map(|c| c.code).collect();
        Err(CoreError::Validation(format!(
            "Invalid channel '{channel}'. Must be one of: {}",
            valid.join(", ")
        )))
    }
}

/// Validate an opt-out reason code against [`OPT_OUT_REASONS`].
pub fn validate_opt_out_reason(reason: &str) -> Result<(), CoreError> {
    if OPT_OUT_REASONS.iter().any(|r| r.code == reason) {
        Ok(())
    } else {
        let valid: Vec<&str> = OPT_OUT_REASONS.iter().map(|r| r.code).collect();
        Err(CoreError::Validation(format!(
            "Invalid opt-out reason '{reason}'. Must be one of: {}",
            valid.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn known_channels_validate() {
        for code in [CHANNEL_WHATSAPP, CHANNEL_WEB, CHANNEL_MOBILE] {
            assert!(validate_channel(code).is_ok());
        }
    }

    #[test]
    fn unknown_channel_lists_valid_values() {
        let err = validate_channel("sms").unwrap_err();
        assert_matches!(&err, CoreError::Validation(msg) if msg.contains("whatsapp, web, mobile"));
    }

    #[test]
    fn opt_out_reasons_validate() {
        assert!(validate_opt_out_reason(OPT_OUT_TOO_MANY_MESSAGES).is_ok());
        assert_matches!(
            validate_opt_out_reason(REASON_REGISTRATION_REJECTED),
            Err(CoreError::Validation(_))
        );
    }
}
