mod migrations;

use crate::db::NewVideo;

fn new_video(video_id: &str) -> NewVideo {
    NewVideo {
        video_id: video_id.to_string(),
        title: format!("Song {}", video_id),
        channel_name: "중년게이머 김실장".to_string(),
        channel_handle: Some("@kimsiljang".to_string()),
        filename: format!("Song {} ({}).ogg", video_id, video_id),
    }
}
