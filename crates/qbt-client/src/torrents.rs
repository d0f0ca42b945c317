//! Inventory listing and bulk delete against `/api/v2/torrents/*`.

use async_trait::async_trait;
use qbt_core::{
    ClientError, ClientResult, RemoveTorrents, Torrent, TorrentFilter, TorrentInspector,
    TorrentQuery, TorrentRemover,
};
use reqwest::{Method, StatusCode};
use tracing::debug;

use crate::client::{QbitClient, ensure_success};
use crate::models::TorrentInfo;

const OP_LIST: &str = "list";
const OP_DELETE: &str = "delete";

#[async_trait]
impl TorrentInspector for QbitClient {
    async fn list(&self, query: &TorrentQuery) -> ClientResult<Vec<Torrent>> {
        let mut params: Vec<(&str, &str)> = Vec::with_capacity(2);
        if let Some(filter) = query.filter {
            params.push(("filter", filter.as_str()));
        }
        if let Some(category) = &query.category {
            params.push(("category", category.as_str()));
        }

        let response = self
            .request(Method::GET, "torrents/info")?
            .query(&params)
            .send()
            .await
            .map_err(|err| ClientError::connection(OP_LIST, err))?;

        if response.status() == StatusCode::BAD_REQUEST
            && let Some(filter) = query.filter
        {
            return Err(ClientError::InvalidFilter {
                value: filter.as_str().to_string(),
            });
        }

        let torrents = ensure_success(OP_LIST, response)
            .await?
            .json::<Vec<TorrentInfo>>()
            .await
            .map_err(|err| ClientError::connection(OP_LIST, err))?;
        debug!(
            filter = query.filter.map(TorrentFilter::as_str),
            category = query.category.as_deref(),
            count = torrents.len(),
            "listed torrents"
        );
        Ok(torrents.into_iter().map(Torrent::from).collect())
    }
}

#[async_trait]
impl TorrentRemover for QbitClient {
    async fn delete(&self, hashes: &[String], options: RemoveTorrents) -> ClientResult<()> {
        let form = [
            ("hashes", hashes.join("|")),
            ("deleteFiles", options.delete_files.to_string()),
        ];
        let response = self
            .request(Method::POST, "torrents/delete")?
            .form(&form)
            .send()
            .await
            .map_err(|err| ClientError::connection(OP_DELETE, err))?;

        ensure_success(OP_DELETE, response).await?;
        debug!(
            count = hashes.len(),
            delete_files = options.delete_files,
            "delete request accepted"
        );
        Ok(())
    }
}
