//! ページネーションの正規化
//!
//! 3つのプラットフォームはそれぞれ違う方法で次ページを示す。
//!
//! - GitHub/GitLab: RFC 5988 の `Link` ヘッダ
//! - GitLab（全件取得時）: `id_after` によるキーセットカーソル
//! - Azure DevOps: `x-ms-continuationtoken` ヘッダ
//!
//! アダプタは [`PageSource`] を実装し、単一ページ取得か全ページ取得かの
//! 選択はここのヘルパーに任せる。

use std::marker::PhantomData;
use std::sync::OnceLock;

use async_trait::async_trait;
use futures::stream::{self, Stream, TryStreamExt};
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::api_client::ApiClient;
use super::platform_interface::PlatformError;
use crate::domain::value_objects::{LinkRelation, PageLink};
use crate::infrastructure::http::{header_get, HttpHeaders};

fn link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="([^"]+)""#).expect("static regex is valid"))
}

/// `Link` ヘッダから `rel="next"` のURLを取り出す
///
/// 見つからなければ `None`。URLは `<` と `>` の間をそのまま返す。
pub fn extract_next_url(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;
    link_pattern()
        .captures_iter(header)
        .find(|caps| caps[2].split_whitespace().any(|rel| rel.eq_ignore_ascii_case("next")))
        .map(|caps| caps[1].to_string())
}

/// 上流APIのホストを公開ホストに書き換える
///
/// クライアントに返すリンクは上流のホストではなく、このサービスの公開
/// ホストを指す必要がある。書き換えは単純な文字列置換。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRewriter {
    upstream_host: String,
    public_host: String,
}

impl LinkRewriter {
    pub fn new(upstream_host: impl Into<String>, public_host: impl Into<String>) -> Self {
        Self {
            upstream_host: upstream_host.into(),
            public_host: public_host.into(),
        }
    }

    pub fn rewrite(&self, url: &str) -> String {
        if self.upstream_host.is_empty() {
            return url.to_string();
        }
        url.replace(&self.upstream_host, &self.public_host)
    }
}

/// `Link` ヘッダを `{url, rel}` の配列に変換する
///
/// 入力の順序を保つ。ヘッダが無い、または1件も解析できなければ空配列。
pub fn to_link_array(link_header: Option<&str>, rewriter: &LinkRewriter) -> Vec<PageLink> {
    let Some(header) = link_header else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for caps in link_pattern().captures_iter(header) {
        let url = rewriter.rewrite(&caps[1]);
        for rel in caps[2].split_whitespace() {
            links.push(PageLink::new(url.clone(), LinkRelation::parse(rel)));
        }
    }
    links
}

/// 取得した1ページ
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub headers: HttpHeaders,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, headers: HttpHeaders) -> Self {
        Self { items, headers }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        header_get(&self.headers, name)
    }

    pub fn link_header(&self) -> Option<&str> {
        self.header("link")
    }
}

/// ページ単位で結果を返すAPIエンドポイント
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// 指定URLのページを取得する
    async fn fetch_page(&self, url: &str) -> Result<Page<Self::Item>, PlatformError>;

    /// 取得済みページから次ページのURLを求める
    fn next_page_url(&self, current_url: &str, page: &Page<Self::Item>) -> Option<String>;
}

/// 最初のページだけを取得する
pub async fn fetch_single<S>(source: &S, url: &str) -> Result<Page<S::Item>, PlatformError>
where
    S: PageSource + ?Sized,
{
    source.fetch_page(url).await
}

/// ページを順に遅延取得するストリーム
///
/// 空のページ、次ページURLが無い、または次ページURLが現在と同じ場合に終了する。
/// エラーが起きたらそこで止まる。
pub fn page_stream<'a, S>(
    source: &'a S,
    first_url: String,
) -> impl Stream<Item = Result<Vec<S::Item>, PlatformError>> + Send + 'a
where
    S: PageSource + ?Sized,
    S::Item: 'a,
{
    stream::try_unfold(Some(first_url), move |next| advance(source, next))
}

async fn advance<S>(
    source: &S,
    next: Option<String>,
) -> Result<Option<(Vec<S::Item>, Option<String>)>, PlatformError>
where
    S: PageSource + ?Sized,
{
    let Some(url) = next else {
        return Ok(None);
    };

    let page = source.fetch_page(&url).await?;
    if page.items.is_empty() {
        debug!(url = %url, "Empty page, pagination finished");
        return Ok(None);
    }

    let following = source
        .next_page_url(&url, &page)
        .filter(|candidate| candidate != &url);
    debug!(url = %url, items = page.items.len(), has_next = following.is_some(), "Fetched page");

    Ok(Some((page.items, following)))
}

/// すべてのページを取得して連結する
pub async fn fetch_all<S>(source: &S, first_url: String) -> Result<Vec<S::Item>, PlatformError>
where
    S: PageSource + ?Sized,
{
    page_stream(source, first_url).try_concat().await
}

/// `Link` ヘッダの `rel="next"` を辿るJSON配列エンドポイント
///
/// GitHubのリポジトリ一覧とGitLabのサブグループ一覧がこの形。
pub struct LinkHeaderPages<'a, T> {
    client: &'a ApiClient,
    _item: PhantomData<fn() -> T>,
}

impl<'a, T> LinkHeaderPages<'a, T> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self {
            client,
            _item: PhantomData,
        }
    }
}

#[async_trait]
impl<'a, T> PageSource for LinkHeaderPages<'a, T>
where
    T: DeserializeOwned + Send + 'static,
{
    type Item = T;

    async fn fetch_page(&self, url: &str) -> Result<Page<T>, PlatformError> {
        let (items, headers) = self.client.get_json::<Vec<T>>(url).await?;
        Ok(Page::new(items, headers))
    }

    fn next_page_url(&self, _current_url: &str, page: &Page<T>) -> Option<String> {
        extract_next_url(page.link_header())
    }
}
