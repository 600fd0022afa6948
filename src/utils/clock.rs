//! 存储层时间戳转换
//!
//! 数据库里时间统一存毫秒整数，保证按列排序时的先后顺序

use chrono::{DateTime, Utc};

pub fn to_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_default()
}

pub fn opt_to_millis(time: Option<DateTime<Utc>>) -> Option<i64> {
    time.map(to_millis)
}

pub fn opt_from_millis(millis: Option<i64>) -> Option<DateTime<Utc>> {
    millis.map(from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn millis_keep_sub_second_precision() {
        let time = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(from_millis(to_millis(time)), time);
        assert_eq!(opt_from_millis(None), None);
    }
}
