use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, instrument};

use crate::models::schema::{DataTable, ExecutionOutcome};

/// 随指令一起发给执行器的代码生成规则
pub const EXECUTOR_INSTRUCTIONS: &str = r#"
이 데이터프레임의 분석을 위해 반드시 다음 규칙을 따르세요.

1. DataFrame 사용 규칙
- SmartDataframe 내부의 df '하나만' 사용해야 합니다.
- df 외에 dfs, temp_df, new_df 등 새로운 리스트나 데이터프레임을 만들지 마십시오.
- 절대 df를 리스트로 감싸거나 반복문으로 처리하지 마십시오.

2. 필터링 규칙
DataFrame 필터링은 반드시 아래 형식만 허용합니다:

df_filtered = df[
    (df['컬럼'] == 값) &
    (df['컬럼'] == 값)
]

아래 동작은 절대 금지합니다:
- (df['컬럼'] == 값).all()
- for df in dfs
- pd.concat()
- 여러 개의 df를 리스트에 담아 처리

3. 그룹바이/집계 규칙
- 집계(sum, mean 등)는 단일 df 객체에서만 수행하십시오.
- df.groupby(...) 는 허용됩니다.
- df_list, concat, merge 등 두 개 이상의 DF를 만들어 조작하는 행위를 금지합니다.

4. 결과 반환 규칙
반드시 아래 형식으로 반환해야 합니다:

result = {"type": "dataframe", "value": df_filtered}

5. 코드 안전 규칙
- Python 문법 오류가 발생하는 코드는 생성하지 마십시오.
- 존재하지 않는 변수(dfs, temp_df 등)를 사용하지 마십시오.
"#;

/// 外部执行器：消费指令 + 当前数据集
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, directive: &str, dataset: &DataTable) -> anyhow::Result<ExecutionOutcome>;
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    directive: &'a str,
    instructions: &'a str,
    dataset: &'a DataTable,
}

pub struct HttpQueryExecutor {
    client: Client,
    url: String,
}

impl HttpQueryExecutor {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl QueryExecutor for HttpQueryExecutor {
    #[instrument(skip(self, dataset), fields(rows = dataset.rows.len()))]
    async fn execute(&self, directive: &str, dataset: &DataTable) -> anyhow::Result<ExecutionOutcome> {
        let request = ExecuteRequest {
            directive,
            instructions: EXECUTOR_INSTRUCTIONS.trim(),
            dataset,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .context("执行器请求发送失败")?
            .error_for_status()
            .context("执行器返回错误状态")?;

        let outcome: ExecutionOutcome = response.json().await.context("执行器响应解析失败")?;
        info!("执行器返回结果, is_table={}", outcome.is_table());
        Ok(outcome)
    }
}
