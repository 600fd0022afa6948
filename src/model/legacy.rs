//! 旧版历史记录的字段映射
//!
//! Older history exports use different names for the same concepts
//! (`giftId`, `giftName`, `senderName`, `amount`, `filePath`, status
//! `verified`) and keep `tableNumber`/`notes` at the top level. Every
//! document, old or new, goes through [`HistoryDocument::into_record`] so
//! the rest of the crate only ever sees [`HistoryRecord`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::history::{HistoryMetadata, HistoryRecord, Outcome, SocialTag};
use crate::model::queue::{ContentType, GiftItem, SocialType};

#[derive(Debug, Error, PartialEq)]
pub enum LegacyError {
    #[error("history document has no transaction id")]
    MissingTransactionId,
    #[error("history status `{0}` is not terminal")]
    NotTerminal(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSocial {
    #[serde(rename = "type")]
    pub kind: Option<SocialType>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub table_number: Option<Value>,
    #[serde(default)]
    pub gift_items: Vec<GiftItem>,
    pub note: Option<String>,
    pub theme: Option<String>,
    #[serde(default)]
    pub social: DocumentSocial,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryDocument {
    #[serde(alias = "giftId")]
    pub transaction_id: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    #[serde(alias = "senderName")]
    pub sender: Option<String>,
    #[serde(alias = "amount")]
    pub price: Option<f64>,
    pub status: Option<String>,
    #[serde(alias = "giftName")]
    pub content: Option<String>,
    #[serde(alias = "filePath")]
    pub media_url: Option<String>,
    pub metadata: Option<DocumentMetadata>,
    pub table_number: Option<Value>,
    pub approval_date: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub reject_reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl HistoryDocument {
    pub fn into_record(self, now: DateTime<Utc>) -> Result<HistoryRecord, LegacyError> {
        let transaction_id = self
            .transaction_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(LegacyError::MissingTransactionId)?;

        let status = self.status.unwrap_or_default();
        let outcome = match status.as_str() {
            "approved" | "verified" => Outcome::Approved,
            "rejected" => Outcome::Rejected,
            "completed" => Outcome::Completed,
            _ => return Err(LegacyError::NotTerminal(status)),
        };

        let media_path = self.media_url.filter(|path| !path.is_empty());
        let content_type = match self.content_type.as_deref() {
            Some("image") => ContentType::Image,
            Some("text") => ContentType::Text,
            Some("gift") => ContentType::Gift,
            Some("birthday") => ContentType::Birthday,
            _ if media_path.is_some() => ContentType::Image,
            _ => ContentType::Text,
        };

        let metadata = self.metadata.unwrap_or_default();
        let table_number = metadata
            .table_number
            .as_ref()
            .or(self.table_number.as_ref())
            .map(table_number_of)
            .unwrap_or(0);
        let note = metadata
            .note
            .or_else(|| self.notes.clone())
            .unwrap_or_default();

        let decision_at = self.approval_date.or(self.created_at).unwrap_or(now);
        let notes = match (self.reject_reason, self.notes) {
            (Some(reason), _) => Some(reason),
            (None, notes) => notes,
        };

        Ok(HistoryRecord {
            id: uuid::Uuid::new_v4().to_string(),
            transaction_id,
            content_type,
            sender: self
                .sender
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| "Unknown".to_string()),
            user_id: None,
            email: None,
            avatar: None,
            amount: self.price.map(|price| price.round() as i64).unwrap_or(0),
            outcome,
            content: self.content.unwrap_or_default(),
            media_path,
            composed: false,
            metadata: HistoryMetadata {
                table_number,
                gift_items: metadata.gift_items,
                note,
                theme: metadata.theme.unwrap_or_default(),
                social: SocialTag {
                    kind: metadata.social.kind,
                    name: metadata.social.name,
                },
            },
            received_at: self.created_at,
            decision_at,
            started_at: None,
            ended_at: None,
            duration_seconds: 0,
            decided_by: self.approved_by,
            notes,
            created_at: self.created_at.unwrap_or(decision_at),
        })
    }
}

// 旧数据里桌号既有数字也有字符串
fn table_number_of(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number.as_i64().unwrap_or(0),
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_field_names_are_normalized() {
        let doc: HistoryDocument = serde_json::from_value(serde_json::json!({
            "giftId": "1734180000000",
            "giftName": "ส่งของขวัญไปยังโต๊ะ 5",
            "senderName": "Mint",
            "tableNumber": "5",
            "amount": 250,
            "status": "verified",
            "approvalDate": "2025-12-14T13:00:00Z",
            "notes": "no ice",
            "type": "gift",
            "filePath": null
        }))
        .unwrap();

        let record = doc.into_record(Utc::now()).unwrap();
        assert_eq!(record.transaction_id, "1734180000000");
        assert_eq!(record.sender, "Mint");
        assert_eq!(record.amount, 250);
        assert_eq!(record.outcome, Outcome::Approved);
        assert_eq!(record.content_type, ContentType::Gift);
        assert_eq!(record.metadata.table_number, 5);
        assert_eq!(record.metadata.note, "no ice");
        assert_eq!(record.media_path, None);
        assert_eq!(record.decision_at.to_rfc3339(), "2025-12-14T13:00:00+00:00");
    }

    #[test]
    fn current_documents_pass_through() {
        let doc: HistoryDocument = serde_json::from_value(serde_json::json!({
            "transactionId": "abc",
            "type": "image",
            "sender": "Beam",
            "price": 100,
            "status": "rejected",
            "content": "hello",
            "mediaUrl": "/uploads/1.jpg",
            "metadata": { "tableNumber": 0, "theme": "#fff", "social": { "type": "ig", "name": "beam" } },
            "rejectReason": "blurry"
        }))
        .unwrap();

        let record = doc.into_record(Utc::now()).unwrap();
        assert_eq!(record.outcome, Outcome::Rejected);
        assert_eq!(record.media_path.as_deref(), Some("/uploads/1.jpg"));
        assert_eq!(record.metadata.social.kind, Some(SocialType::Ig));
        assert_eq!(record.metadata.theme, "#fff");
        assert_eq!(record.notes.as_deref(), Some("blurry"));
    }

    #[test]
    fn type_falls_back_on_media_presence() {
        let doc = HistoryDocument {
            transaction_id: Some("t".into()),
            status: Some("completed".into()),
            media_url: Some("/uploads/x.png".into()),
            ..Default::default()
        };
        assert_eq!(doc.into_record(Utc::now()).unwrap().content_type, ContentType::Image);
    }

    #[test]
    fn pending_and_anonymous_documents_are_refused() {
        let pending = HistoryDocument {
            transaction_id: Some("t".into()),
            status: Some("pending".into()),
            ..Default::default()
        };
        assert_eq!(
            pending.into_record(Utc::now()),
            Err(LegacyError::NotTerminal("pending".into()))
        );

        let missing = HistoryDocument::default();
        assert_eq!(
            missing.into_record(Utc::now()),
            Err(LegacyError::MissingTransactionId)
        );
    }
}
