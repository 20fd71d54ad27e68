use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::common::result::{MigratorResult, ResultExt};
use crate::domain::value_objects::RepoName;

/// 1ジョブ分の一時作業ディレクトリ
///
/// `<work_dir>/<repo>-XXXXXX/` を作り、ミラーは `<repo>.git` として中に置く。
/// ドロップされると中身ごと削除されるので、どの経路で処理を抜けても残らない。
pub struct ScratchDir {
    dir: TempDir,
    repo_path: PathBuf,
}

impl ScratchDir {
    /// 作業ディレクトリを確保する（親ディレクトリが無ければ作る）
    pub fn acquire(work_dir: &Path, repo_name: &RepoName) -> MigratorResult<Self> {
        fs::create_dir_all(work_dir)
            .with_filesystem_error("Failed to create work directory", Some(work_dir.to_path_buf()))?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", repo_name))
            .tempdir_in(work_dir)
            .with_filesystem_error("Failed to create scratch directory", Some(work_dir.to_path_buf()))?;

        let repo_path = dir.path().join(format!("{}.git", repo_name));
        Ok(Self { dir, repo_path })
    }

    /// 一時ディレクトリ自体のパス
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// ミラーのクローン先
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// 明示的に削除し、失敗を呼び出し元に返す
    pub fn release(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
