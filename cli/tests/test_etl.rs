//! End-to-end ETL runs over temporary input directories.

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use sparkify_cli::commands::etl::{self, DataKind};
    use sparkify_shared::WarehouseStore;
    use tempfile::TempDir;

    const SONG_A: &str = r#"{"num_songs": 1, "artist_id": "AR5KOSW1187FB35FF4", "artist_latitude": 49.80388, "artist_longitude": 15.47491, "artist_location": "Dubai UAE", "artist_name": "Elena", "song_id": "SOZCTXZ12AB0182364", "title": "Setanta matins", "duration": 269.58322, "year": 0}"#;
    const SONG_B: &str = r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;

    fn event(
        page: &str,
        user_id: &str,
        level: &str,
        ts: i64,
        song: Option<(&str, &str, f64)>,
    ) -> String {
        let (title, artist, length) = match song {
            Some((title, artist, length)) => (
                serde_json::json!(title),
                serde_json::json!(artist),
                serde_json::json!(length),
            ),
            None => (serde_json::Value::Null, serde_json::Value::Null, serde_json::Value::Null),
        };
        serde_json::json!({
            "artist": artist,
            "auth": "Logged In",
            "firstName": "Jacob",
            "gender": "M",
            "itemInSession": 3,
            "lastName": "Klein",
            "length": length,
            "level": level,
            "location": "Tampa-St. Petersburg-Clearwater, FL",
            "method": "PUT",
            "page": page,
            "registration": 1540558108796.0_f64,
            "sessionId": 518,
            "song": title,
            "status": 200,
            "ts": ts,
            "userAgent": "Mozilla/5.0",
            "userId": user_id,
        })
        .to_string()
    }

    fn write_inputs(root: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let song_dir = root.join("song_data");
        let log_dir = root.join("log_data");
        fs::create_dir_all(song_dir.join("A").join("A")).expect("song dirs");
        fs::create_dir_all(song_dir.join("B")).expect("song dirs");
        fs::create_dir_all(log_dir.join("2018").join("11")).expect("log dirs");

        fs::write(song_dir.join("A").join("A").join("TRAAAAW128F429D538.json"), SONG_A)
            .expect("write song");
        fs::write(song_dir.join("B").join("TRAAABD128F429CF47.json"), SONG_B).expect("write song");

        let day_one = [
            event("Home", "73", "paid", 1_541_106_106_796, None),
            event(
                "NextSong",
                "73",
                "free",
                1_541_106_496_796,
                Some(("Setanta matins", "Elena", 269.58322)),
            ),
            event(
                "NextSong",
                "73",
                "free",
                1_541_106_673_796,
                Some(("Unknown Track", "Nobody", 120.0)),
            ),
            event("Logout", "", "free", 1_541_106_700_796, None),
        ]
        .join("\n");
        let day_two = event(
            "NextSong",
            "73",
            "paid",
            1_541_192_896_796,
            Some(("I Didn't Mean To", "Casual", 218.93179)),
        );
        fs::write(log_dir.join("2018").join("11").join("2018-11-01-events.json"), day_one)
            .expect("write log");
        fs::write(log_dir.join("2018").join("11").join("2018-11-02-events.json"), day_two)
            .expect("write log");

        (song_dir, log_dir)
    }

    fn query_i64(store: &WarehouseStore, sql: &str) -> i64 {
        store
            .connection()
            .query_row(sql, [], |row| row.get(0))
            .expect("scalar query")
    }

    #[test]
    fn run_loads_star_schema() {
        let dir = TempDir::new().expect("create temp dir");
        let (song_dir, log_dir) = write_inputs(dir.path());
        let db_path = dir.path().join("db").join("sparkify.sqlite");

        etl::run(&db_path, &song_dir, &log_dir).expect("etl run");

        let store = WarehouseStore::open(&db_path).expect("reopen store");
        assert_eq!(store.count_rows("songs").expect("count"), 2);
        assert_eq!(store.count_rows("artists").expect("count"), 2);
        assert_eq!(store.count_rows("users").expect("count"), 1);
        assert_eq!(store.count_rows("time").expect("count"), 3);
        assert_eq!(store.count_rows("songplays").expect("count"), 3);

        assert_eq!(
            query_i64(&store, "SELECT COUNT(*) FROM songplays WHERE song_id IS NOT NULL"),
            2
        );
        let level: String = store
            .connection()
            .query_row("SELECT level FROM users WHERE user_id = 73", [], |row| row.get(0))
            .expect("user level");
        assert_eq!(level, "paid");

        let location: Option<String> = store
            .connection()
            .query_row(
                "SELECT location FROM artists WHERE artist_id = 'ARD7TVE1187B99BFB1'",
                [],
                |row| row.get(0),
            )
            .expect("artist location");
        assert_eq!(location, None);
    }

    #[test]
    fn rerun_does_not_duplicate_rows() {
        let dir = TempDir::new().expect("create temp dir");
        let (song_dir, log_dir) = write_inputs(dir.path());
        let db_path = dir.path().join("sparkify.sqlite");

        etl::run(&db_path, &song_dir, &log_dir).expect("first run");
        etl::run(&db_path, &song_dir, &log_dir).expect("second run");

        let store = WarehouseStore::open(&db_path).expect("reopen store");
        assert_eq!(store.count_rows("songplays").expect("count"), 3);
        assert_eq!(store.count_rows("time").expect("count"), 3);
        assert_eq!(store.count_rows("songs").expect("count"), 2);
    }

    #[test]
    fn log_file_stats_count_matches() {
        let dir = TempDir::new().expect("create temp dir");
        let (song_dir, log_dir) = write_inputs(dir.path());

        let mut store = WarehouseStore::open_in_memory().expect("open store");
        store.create_tables().expect("create tables");
        let processed = etl::process_data(&mut store, &song_dir, DataKind::Song).expect("songs");
        assert_eq!(processed, 2);

        let path = log_dir.join("2018").join("11").join("2018-11-01-events.json");
        let stats = store
            .load(|writer| etl::process_log_file(writer, &path))
            .expect("log file");
        assert_eq!(stats.events, 4);
        assert_eq!(stats.song_plays, 2);
        assert_eq!(stats.matched, 1);

        let start_time: String = store
            .connection()
            .query_row(
                "SELECT start_time FROM songplays WHERE song_id = 'SOZCTXZ12AB0182364'",
                [],
                |row| row.get(0),
            )
            .expect("songplay start time");
        assert_eq!(start_time, "2018-11-01 21:08:16.796");
    }

    #[test]
    fn malformed_log_file_is_rolled_back() {
        let dir = TempDir::new().expect("create temp dir");
        let (_, log_dir) = write_inputs(dir.path());
        let broken = log_dir.join("2018").join("11").join("2018-11-03-events.json");
        let good = event("NextSong", "80", "free", 1_541_279_296_796, None);
        fs::write(&broken, format!("{good}\n{{not json\n")).expect("write broken log");

        let mut store = WarehouseStore::open_in_memory().expect("open store");
        store.create_tables().expect("create tables");
        let err = etl::process_data(&mut store, &log_dir, DataKind::Log).expect_err("broken file");
        assert!(format!("{err:#}").contains("2018-11-03-events.json:2"));

        // The two good files were committed; the broken one left nothing behind.
        assert_eq!(query_i64(&store, "SELECT COUNT(*) FROM users WHERE user_id = 80"), 0);
        assert_eq!(store.count_rows("songplays").expect("count"), 3);
    }
}
