//! Agent, report, and chat operations for the repository.

use crate::domain::{
    Agent, AnalysisReport, ChatMessage, ChatRole, Personality, Recommendation, Symbol, Thresholds,
    TimeMs,
};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

use super::{parse_decimal, parse_uuid, Repository};

impl Repository {
    pub async fn insert_agent(&self, agent: &Agent) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO agents (
                id, owner_id, name, personality,
                rsi_oversold, rsi_overbought, min_confidence, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(agent.id.to_string())
        .bind(agent.owner_id.to_string())
        .bind(agent.name.as_str())
        .bind(agent.personality.as_str())
        .bind(agent.thresholds.rsi_oversold)
        .bind(agent.thresholds.rsi_overbought)
        .bind(agent.thresholds.min_confidence)
        .bind(agent.created_at.as_i64())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn get_agent(&self, id: &Uuid) -> Result<Option<Agent>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, name, personality,
                   rsi_oversold, rsi_overbought, min_confidence, created_at
            FROM agents WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| parse_agent(&r)).transpose()
    }

    /// List an owner's agents, oldest first.
    pub async fn list_agents(&self, owner_id: &Uuid) -> Result<Vec<Agent>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, name, personality,
                   rsi_oversold, rsi_overbought, min_confidence, created_at
            FROM agents WHERE owner_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner_id.to_string())
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(parse_agent).collect()
    }

    /// Update name, personality, and thresholds. Returns false when the row
    /// does not exist.
    pub async fn update_agent(&self, agent: &Agent) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE agents SET name = ?, personality = ?,
                   rsi_oversold = ?, rsi_overbought = ?, min_confidence = ?
            WHERE id = ?
            "#,
        )
        .bind(agent.name.as_str())
        .bind(agent.personality.as_str())
        .bind(agent.thresholds.rsi_oversold)
        .bind(agent.thresholds.rsi_overbought)
        .bind(agent.thresholds.min_confidence)
        .bind(agent.id.to_string())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete an agent and its dependent reports and chat history.
    pub async fn delete_agent(&self, id: &Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM analysis_reports WHERE agent_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM chat_messages WHERE agent_id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM agents WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Analysis reports
    // =========================================================================

    pub async fn insert_report(&self, report: &AnalysisReport) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO analysis_reports (
                id, agent_id, symbol, recommendation, confidence, body, price, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(report.id.to_string())
        .bind(report.agent_id.to_string())
        .bind(report.symbol.as_str())
        .bind(report.recommendation.as_str())
        .bind(report.confidence)
        .bind(report.body.as_str())
        .bind(report.price.to_canonical_string())
        .bind(report.created_at.as_i64())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    pub async fn get_report(&self, id: &Uuid) -> Result<Option<AnalysisReport>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, agent_id, symbol, recommendation, confidence, body, price, created_at
            FROM analysis_reports WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(self.pool())
        .await?;

        row.map(|r| parse_report(&r)).transpose()
    }

    /// List an agent's reports, most recent first.
    pub async fn list_reports(
        &self,
        agent_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<AnalysisReport>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, agent_id, symbol, recommendation, confidence, body, price, created_at
            FROM analysis_reports WHERE agent_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(agent_id.to_string())
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(parse_report).collect()
    }

    // =========================================================================
    // Chat messages
    // =========================================================================

    pub async fn insert_chat_message(&self, msg: &ChatMessage) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, user_id, agent_id, role, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(msg.id.to_string())
        .bind(msg.user_id.to_string())
        .bind(msg.agent_id.to_string())
        .bind(msg.role.as_str())
        .bind(msg.content.as_str())
        .bind(msg.created_at.as_i64())
        .execute(self.pool())
        .await?;

        Ok(())
    }

    /// Chat history between a user and an agent, oldest first.
    pub async fn chat_history(
        &self,
        user_id: &Uuid,
        agent_id: &Uuid,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, agent_id, role, content, created_at
            FROM chat_messages
            WHERE user_id = ? AND agent_id = ?
            ORDER BY created_at ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(user_id.to_string())
        .bind(agent_id.to_string())
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|r| {
                let role_str: String = r.get("role");
                Ok(ChatMessage {
                    id: parse_uuid(r.get("id"))?,
                    user_id: parse_uuid(r.get("user_id"))?,
                    agent_id: parse_uuid(r.get("agent_id"))?,
                    role: ChatRole::from_str(&role_str).map_err(|_| {
                        sqlx::Error::Decode(format!("bad chat role: {}", role_str).into())
                    })?,
                    content: r.get("content"),
                    created_at: TimeMs::new(r.get("created_at")),
                })
            })
            .collect()
    }
}

fn parse_agent(row: &sqlx::sqlite::SqliteRow) -> Result<Agent, sqlx::Error> {
    let personality_str: String = row.get("personality");
    Ok(Agent {
        id: parse_uuid(row.get("id"))?,
        owner_id: parse_uuid(row.get("owner_id"))?,
        name: row.get("name"),
        personality: Personality::from_str(&personality_str).map_err(|_| {
            sqlx::Error::Decode(format!("bad personality: {}", personality_str).into())
        })?,
        thresholds: Thresholds {
            rsi_oversold: row.get("rsi_oversold"),
            rsi_overbought: row.get("rsi_overbought"),
            min_confidence: row.get("min_confidence"),
        },
        created_at: TimeMs::new(row.get("created_at")),
    })
}

fn parse_report(row: &sqlx::sqlite::SqliteRow) -> Result<AnalysisReport, sqlx::Error> {
    let rec_str: String = row.get("recommendation");
    Ok(AnalysisReport {
        id: parse_uuid(row.get("id"))?,
        agent_id: parse_uuid(row.get("agent_id"))?,
        symbol: Symbol::new(row.get::<String, _>("symbol")),
        recommendation: Recommendation::from_str(&rec_str)
            .map_err(|_| sqlx::Error::Decode(format!("bad recommendation: {}", rec_str).into()))?,
        confidence: row.get("confidence"),
        body: row.get("body"),
        price: parse_decimal(row.get("price"))?,
        created_at: TimeMs::new(row.get("created_at")),
    })
}
