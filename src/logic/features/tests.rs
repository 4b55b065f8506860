//! Integration Tests for Feature Extraction
//!
//! Tests các extractors hoạt động đúng khi đi qua window + dispatch.

#[cfg(test)]
mod integration_tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::{Map, Value};

    use crate::logic::error::PipelineError;
    use crate::logic::features::{extract_at, extract_str, FeatureExtractor, FixedClock};
    use crate::logic::normalizer::{AlertRecord, FlowRecord, HostEventRecord, NormalizedLogRecord};
    use crate::logic::source::SourceKind;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    fn flow(orig_bytes: u64, resp_bytes: u64, duration: f64) -> FlowRecord {
        FlowRecord {
            timestamp: now() - Duration::seconds(10),
            uid: "C1".into(),
            source_ip: "10.0.0.1".parse().unwrap(),
            source_port: 40000,
            dest_ip: "10.0.0.2".parse().unwrap(),
            dest_port: 80,
            protocol: "tcp".into(),
            service: None,
            duration,
            orig_bytes,
            resp_bytes,
            orig_pkts: 4,
            resp_pkts: 2,
            missed_bytes: 0,
            orig_ip_bytes: 0,
            resp_ip_bytes: 0,
            conn_state: Some("SF".into()),
            local_orig: false,
            local_resp: false,
            history: None,
        }
    }

    fn alert(src: &str, proto: &str, severity: Option<i64>, signature_id: Option<u64>) -> AlertRecord {
        AlertRecord {
            timestamp: now() - Duration::seconds(30),
            event_type: "alert".into(),
            src_ip: src.parse().unwrap(),
            src_port: Some(1234),
            dest_ip: "10.0.0.1".parse().unwrap(),
            dest_port: Some(22),
            proto: proto.into(),
            flow_id: None,
            in_iface: None,
            event_category: None,
            app_proto: None,
            severity,
            signature: None,
            signature_id,
            alert: None,
            flow: None,
            tcp: None,
        }
    }

    fn host_event(name: &str) -> HostEventRecord {
        HostEventRecord {
            timestamp: now() - Duration::seconds(5),
            name: name.into(),
            action: "added".into(),
            columns: Map::new(),
            host_identifier: "web-01".into(),
            calendar_time: "Mon Jan 15 11:59:55 2024 UTC".into(),
            unix_time: 0,
            counter: None,
            decorations: None,
        }
    }

    fn wrap<T: Into<NormalizedLogRecord>>(records: Vec<T>) -> Vec<NormalizedLogRecord> {
        records.into_iter().map(Into::into).collect()
    }

    // ------------------------------------------------------------------------
    // Empty windows
    // ------------------------------------------------------------------------

    #[test]
    fn test_empty_input_gives_zero_vector_of_fixed_length() {
        for (kind, len) in [(SourceKind::Flow, 7), (SourceKind::Alert, 6), (SourceKind::HostEvent, 5)] {
            let vector = extract_at(kind, &[], 5, now()).unwrap();
            assert_eq!(vector.len(), len);
            assert!(vector.as_slice().iter().all(|&v| v == 0.0));
            assert_eq!(vector.source(), kind);
        }
    }

    #[test]
    fn test_records_outside_window_give_zero_vector() {
        let mut old = flow(1000, 500, 2.0);
        old.timestamp = now() - Duration::minutes(10);
        let mut future = flow(1000, 500, 2.0);
        future.timestamp = now() + Duration::seconds(1);

        let vector = extract_at(SourceKind::Flow, &wrap(vec![old, future]), 5, now()).unwrap();
        assert_eq!(vector.as_slice(), &[0.0; 7]);
        assert_eq!(vector.records_in_window(), 0);
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let mut at_start = flow(600, 0, 0.0);
        at_start.timestamp = now() - Duration::minutes(1);
        let mut at_end = flow(600, 0, 0.0);
        at_end.timestamp = now();

        let vector = extract_at(SourceKind::Flow, &wrap(vec![at_start, at_end]), 1, now()).unwrap();
        assert_eq!(vector.records_in_window(), 2);
        assert_eq!(vector.get_by_name("bytes_per_second"), Some(20.0));
    }

    // ------------------------------------------------------------------------
    // Flow
    // ------------------------------------------------------------------------

    #[test]
    fn test_flow_bytes_ratio_scenario() {
        let records = wrap(vec![flow(1000, 500, 2.0)]);
        let vector = extract_at(SourceKind::Flow, &records, 1, now()).unwrap();

        assert_eq!(vector.get_by_name("bytes_ratio"), Some(2.0));
        assert_eq!(vector.get_by_name("bytes_per_second"), Some(1500.0 / 60.0));
        assert_eq!(vector.get_by_name("packets_per_second"), Some(6.0 / 60.0));
        assert_eq!(vector.get_by_name("unique_ips"), Some(2.0));
        assert_eq!(vector.get_by_name("connection_duration"), Some(2.0));
    }

    #[test]
    fn test_flow_zero_resp_bytes_excluded_from_ratio() {
        let records = wrap(vec![flow(1000, 500, 2.0), flow(9999, 0, 4.0)]);
        let vector = extract_at(SourceKind::Flow, &records, 1, now()).unwrap();

        assert_eq!(vector.get_by_name("bytes_ratio"), Some(2.0));
        assert_eq!(vector.get_by_name("connection_duration"), Some(3.0));
    }

    #[test]
    fn test_flow_ratio_zero_when_no_responder_bytes() {
        let records = wrap(vec![flow(1000, 0, 1.0)]);
        let vector = extract_at(SourceKind::Flow, &records, 1, now()).unwrap();
        assert_eq!(vector.get_by_name("bytes_ratio"), Some(0.0));
    }

    #[test]
    fn test_flow_rates_scale_with_totals() {
        let single = wrap(vec![flow(1000, 500, 1.0)]);
        let doubled = wrap(vec![flow(1000, 500, 1.0), flow(1000, 500, 1.0)]);

        let a = extract_at(SourceKind::Flow, &single, 5, now()).unwrap();
        let b = extract_at(SourceKind::Flow, &doubled, 5, now()).unwrap();

        assert_eq!(b.get(0).unwrap(), 2.0 * a.get(0).unwrap());
        assert_eq!(b.get(1).unwrap(), 2.0 * a.get(1).unwrap());
    }

    #[test]
    fn test_flow_local_and_error_ratios() {
        let mut rejected = flow(10, 0, 0.0);
        rejected.conn_state = Some("REJ".into());
        rejected.local_orig = true;
        let mut half_open = flow(10, 0, 0.0);
        half_open.conn_state = Some("S0".into());
        let clean = flow(10, 5, 0.0);
        let mut unknown_state = flow(10, 5, 0.0);
        unknown_state.conn_state = None;

        let records = wrap(vec![rejected, half_open, clean, unknown_state]);
        let vector = extract_at(SourceKind::Flow, &records, 5, now()).unwrap();

        assert_eq!(vector.get_by_name("local_network_ratio"), Some(0.25));
        assert_eq!(vector.get_by_name("error_ratio"), Some(0.5));
    }

    // ------------------------------------------------------------------------
    // Alert
    // ------------------------------------------------------------------------

    #[test]
    fn test_alert_features() {
        let records = wrap(vec![
            alert("192.168.1.10", "TCP", Some(1), Some(100)),
            alert("192.168.1.10", "UDP", Some(3), Some(100)),
            alert("192.168.1.11", "TCP", None, Some(200)),
            alert("192.168.1.12", "UDP", Some(4), None),
        ]);
        let vector = extract_at(SourceKind::Alert, &records, 1, now()).unwrap();

        // (1 + 3 + 4) / 3 present severities
        assert_eq!(vector.get_by_name("alert_severity_avg"), Some(8.0 / 3.0));
        // 100, 200 and the absent key
        assert_eq!(vector.get_by_name("unique_signatures"), Some(3.0));
        assert_eq!(vector.get_by_name("event_frequency"), Some(4.0 / 60.0));
        assert_eq!(vector.get_by_name("high_severity_ratio"), Some(0.5));
        assert_eq!(vector.get_by_name("source_ip_diversity"), Some(0.75));
        assert_eq!(vector.get_by_name("protocol_entropy"), Some(1.0));
    }

    #[test]
    fn test_alert_without_severity_averages_zero() {
        let records = wrap(vec![alert("10.1.1.1", "TCP", None, None)]);
        let vector = extract_at(SourceKind::Alert, &records, 5, now()).unwrap();
        assert_eq!(vector.get_by_name("alert_severity_avg"), Some(0.0));
        assert_eq!(vector.get_by_name("protocol_entropy"), Some(0.0));
    }

    // ------------------------------------------------------------------------
    // Host events
    // ------------------------------------------------------------------------

    #[test]
    fn test_host_event_rates_and_priority() {
        let records = wrap(vec![
            host_event("process_network_event"),
            host_event("process_events"),
            host_event("file_events"),
            host_event("socket_network_events"),
            host_event("user_events"),
            host_event("kernel_info"),
        ]);
        let vector = extract_at(SourceKind::HostEvent, &records, 1, now()).unwrap();

        assert_eq!(vector.as_slice(), &[2.0 / 60.0, 1.0 / 60.0, 1.0 / 60.0, 1.0 / 60.0, 1.0 / 60.0]);
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    #[test]
    fn test_mixed_sources_rejected() {
        let records = vec![
            NormalizedLogRecord::from(flow(1, 1, 1.0)),
            NormalizedLogRecord::from(host_event("process_events")),
        ];
        let err = extract_at(SourceKind::Flow, &records, 5, now()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SourceMismatch { expected: SourceKind::Flow, found: SourceKind::HostEvent }
        ));
    }

    #[test]
    fn test_zero_window_rejected_for_records() {
        let empty = extract_at(SourceKind::Flow, &[], 0, now()).unwrap();
        assert_eq!(empty.as_slice(), &[0.0; 7]);

        let records = wrap(vec![flow(1, 1, 1.0)]);
        let err = extract_at(SourceKind::Flow, &records, 0, now()).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidWindow(0)));
    }

    #[test]
    fn test_unknown_source_same_error_as_normalizer() {
        let from_extractor = extract_str("netflow", &[], 5, now()).unwrap_err();
        let from_normalizer =
            crate::logic::normalizer::normalize_str("netflow", &Value::Null).unwrap_err();
        assert_eq!(from_extractor.to_string(), from_normalizer.to_string());
    }

    #[test]
    fn test_extractor_uses_injected_clock() {
        let extractor = FeatureExtractor::with_clock(FixedClock(now()));
        let records = wrap(vec![flow(1000, 500, 2.0)]);

        let vector = extractor.extract(SourceKind::Flow, &records, 1).unwrap();
        assert_eq!(vector.get_by_name("bytes_ratio"), Some(2.0));

        let later = FeatureExtractor::with_clock(FixedClock(now() + Duration::hours(1)));
        let vector = later.extract(SourceKind::Flow, &records, 1).unwrap();
        assert_eq!(vector.records_in_window(), 0);
    }
}
