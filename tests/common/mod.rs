#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use campaign_lens::dataset::{DataPaths, Datasets};
use campaign_lens::io_utils::ReadOptions;
use tempfile::{TempDir, tempdir};

pub const INFLUENCERS: &str = "\
ID,Name,Platform,Category,Gender,Follower Count
1,Asha,Instagram,Fitness,F,12000
2,Ravi,YouTube,Nutrition,M,250000
3,Mei,Instagram,Fitness,F,48000
4,Dev,Twitter,Lifestyle,M,3000
";

pub const POSTS: &str = "\
influencer_id,platform,post_date,url,caption,reach,likes,comments
1,instagram,2025-01-05,https://example.com/p/1,Morning protein,5000,400,12
2,youtube,2025-02-10,https://example.com/p/2,Stack review,90000,3000,210
3,instagram,2025-03-15 18:30:00,https://example.com/p/3,Leg day,7000,650,40
1,instagram,2025-04-01,https://example.com/p/4,,4000,,3
";

pub const TRACKING: &str = "\
influencer_id,campaign,product,revenue,orders
1,Summer,Whey,1000,10
3,Summer,Bar,100,2
3,Winter,Whey,150,3
2,Winter,Bar,,1
";

pub const PAYOUTS: &str = "\
influencer_id,basis,rate,orders,total_payout
1,post,500,1,500
2,order,10,40,0
3,post,1000,1,1000
4,post,200,1,200
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Workspace pre-populated with the four standard dataset files.
    pub fn with_datasets() -> Self {
        let workspace = Self::new();
        workspace.write_datasets(INFLUENCERS, POSTS, TRACKING, PAYOUTS);
        workspace
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    pub fn write_datasets(&self, influencers: &str, posts: &str, tracking: &str, payouts: &str) {
        self.write("influencers.csv", influencers);
        self.write("posts.csv", posts);
        self.write("tracking_data.csv", tracking);
        self.write("payouts.csv", payouts);
    }

    pub fn load(&self) -> Datasets {
        Datasets::load(&DataPaths::in_dir(self.path()), ReadOptions::default())
            .expect("load datasets")
    }
}
