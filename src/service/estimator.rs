//! 排队位置与等待时间估算
//!
//! Pure function over a queue snapshot. Approved items play strictly in
//! (approvedAt, seq) order, so an estimate never grows while earlier items
//! finish. Missing timestamps degrade to zero or an omitted projection.

use chrono::{DateTime, Duration, Utc};

use crate::dto::order_status_dto::OrderStatus;
use crate::model::queue::{QueueRecord, QueueStatus};

/// 记录不在队列里时返回 None
pub fn estimate(queue: &[QueueRecord], id: &str, now: DateTime<Utc>) -> Option<OrderStatus> {
    let target = queue.iter().find(|record| record.id == id)?;
    let status = match target.status {
        QueueStatus::Pending => {
            let key = (target.received_at, target.seq);
            let ahead = queue
                .iter()
                .filter(|r| r.status == QueueStatus::Pending && (r.received_at, r.seq) < key)
                .count() as i64;
            OrderStatus::Pending { position: ahead + 1 }
        }
        QueueStatus::Approved => {
            let playing = queue.iter().find(|r| r.status == QueueStatus::Playing);
            let key = approval_key(target);
            let ahead: Vec<&QueueRecord> = queue
                .iter()
                .filter(|r| r.status == QueueStatus::Approved && approval_key(r) < key)
                .collect();
            let lead_seconds = playing.map(|r| r.remaining_seconds(now)).unwrap_or(0)
                + ahead.iter().map(|r| r.duration_seconds).sum::<i64>();
            let position = ahead.len() as i64 + i64::from(playing.is_some()) + 1;
            let (projected_start, projected_end) = match target.approved_at {
                Some(_) => {
                    let start = now + Duration::seconds(lead_seconds);
                    (Some(start), Some(start + Duration::seconds(target.duration_seconds)))
                }
                None => (None, None),
            };
            OrderStatus::Approved {
                position,
                lead_seconds,
                projected_start,
                projected_end,
            }
        }
        QueueStatus::Playing => OrderStatus::Playing {
            position: 1,
            remaining_seconds: target.remaining_seconds(now),
        },
    };
    Some(status)
}

// 缺少 approvedAt 的排在最后
fn approval_key(record: &QueueRecord) -> (bool, Option<DateTime<Utc>>, i64) {
    (record.approved_at.is_none(), record.approved_at, record.seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::queue::ContentType;
    use chrono::TimeZone;

    fn record(seq: i64, status: QueueStatus, at: DateTime<Utc>, duration: i64) -> QueueRecord {
        let mut record = QueueRecord::pending(ContentType::Image, format!("s{seq}"), at);
        record.id = format!("r{seq}");
        record.seq = seq;
        record.status = status;
        record.duration_seconds = duration;
        if status != QueueStatus::Pending {
            record.approved_at = Some(at);
        }
        record
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 14, 20, 0, 0).unwrap()
    }

    #[test]
    fn approved_lead_counts_remaining_play_time() {
        let now = t0() + Duration::seconds(26);
        let mut playing = record(1, QueueStatus::Playing, t0(), 30);
        playing.playing_at = Some(t0());
        let waiting = record(2, QueueStatus::Approved, t0() + Duration::seconds(20), 10);
        let queue = vec![playing, waiting];

        assert_eq!(
            estimate(&queue, "r2", now),
            Some(OrderStatus::Approved {
                position: 2,
                lead_seconds: 4,
                projected_start: Some(now + Duration::seconds(4)),
                projected_end: Some(now + Duration::seconds(14)),
            })
        );
        assert_eq!(
            estimate(&queue, "r1", now),
            Some(OrderStatus::Playing { position: 1, remaining_seconds: 4 })
        );
    }

    #[test]
    fn approved_items_queue_by_approval_time() {
        let now = t0();
        let early = record(5, QueueStatus::Approved, t0() - Duration::seconds(60), 15);
        let late = record(3, QueueStatus::Approved, t0() - Duration::seconds(10), 20);
        let queue = vec![late, early];

        match estimate(&queue, "r3", now) {
            Some(OrderStatus::Approved { position, lead_seconds, .. }) => {
                assert_eq!(position, 2);
                assert_eq!(lead_seconds, 15);
            }
            other => panic!("unexpected estimate {other:?}"),
        }
    }

    #[test]
    fn pending_position_is_fifo_with_seq_tie_break() {
        let queue = vec![
            record(1, QueueStatus::Pending, t0(), 10),
            record(2, QueueStatus::Pending, t0(), 10),
            record(3, QueueStatus::Approved, t0() - Duration::seconds(5), 10),
        ];
        assert_eq!(estimate(&queue, "r1", t0()), Some(OrderStatus::Pending { position: 1 }));
        assert_eq!(estimate(&queue, "r2", t0()), Some(OrderStatus::Pending { position: 2 }));
        assert_eq!(estimate(&queue, "missing", t0()), None);
    }

    #[test]
    fn missing_timestamps_degrade_gracefully() {
        let mut playing = record(1, QueueStatus::Playing, t0(), 30);
        playing.playing_at = None;
        let mut waiting = record(2, QueueStatus::Approved, t0(), 10);
        waiting.approved_at = None;
        let queue = vec![playing, waiting];

        assert_eq!(
            estimate(&queue, "r1", t0()),
            Some(OrderStatus::Playing { position: 1, remaining_seconds: 0 })
        );
        assert_eq!(
            estimate(&queue, "r2", t0()),
            Some(OrderStatus::Approved {
                position: 2,
                lead_seconds: 0,
                projected_start: None,
                projected_end: None,
            })
        );
    }
}
