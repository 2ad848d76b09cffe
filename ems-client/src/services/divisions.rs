// ems-client/src/services/divisions.rs
// 部门接口

use shared::request::{DIVISIONS_PAGE_SIZE, DivisionQuery};
use shared::response::DivisionsData;
use shared::{ApiPagination, Division, PagedEnvelope};

use crate::ClientResult;
use crate::http::ApiClient;

/// 一页部门
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivisionPage {
    pub divisions: Vec<Division>,
    pub pagination: ApiPagination,
}

#[derive(Debug, Clone)]
pub struct DivisionService {
    api: ApiClient,
}

impl DivisionService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// GET /divisions
    pub async fn list(&self, query: &DivisionQuery) -> ClientResult<DivisionPage> {
        let resp: PagedEnvelope<DivisionsData> =
            self.api.get_with_query("divisions", query).await?;
        Ok(DivisionPage {
            divisions: resp.data.divisions,
            pagination: resp.pagination,
        })
    }

    /// 逐页拉取全部部门 (至少请求一次)
    pub async fn all(&self) -> ClientResult<Vec<Division>> {
        let mut divisions = Vec::new();
        let mut page = 1;
        loop {
            let resp = self
                .list(&DivisionQuery::page(page, DIVISIONS_PAGE_SIZE))
                .await?;
            divisions.extend(resp.divisions);
            page += 1;
            if page > resp.pagination.last_page {
                break;
            }
        }
        tracing::debug!(count = divisions.len(), pages = page - 1, "Loaded all divisions");
        Ok(divisions)
    }
}
