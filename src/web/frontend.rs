//! Embedded HTML/CSS/JS frontend for the enhance web dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>enhance Dashboard</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; line-height: 1.5; }
.app { max-width: 1200px; margin: 0 auto; padding: 24px; }
header {
  display: flex; align-items: center; justify-content: space-between;
  margin-bottom: 24px; padding-bottom: 16px; border-bottom: 1px solid var(--border);
}
header h1 { font-size: 24px; font-weight: 600; }
header h1 .logo { color: var(--accent); font-family: var(--mono); font-weight: 700; }
.badge {
  display: inline-flex; gap: 4px; padding: 4px 10px; border-radius: 12px; font-size: 12px;
  background: var(--surface); border: 1px solid var(--border);
}
.badge.ok { border-color: var(--green); color: var(--green); }
.badge.warn { border-color: var(--yellow); color: var(--yellow); }
nav {
  display: flex; gap: 4px; margin-bottom: 24px; background: var(--surface);
  border-radius: var(--radius); padding: 4px; border: 1px solid var(--border);
}
nav button {
  flex: 1; padding: 8px 16px; border: none; border-radius: 6px; background: transparent;
  color: var(--text-muted); font-size: 13px; font-weight: 500; cursor: pointer;
}
nav button:hover { color: var(--text); }
nav button.active { background: var(--accent); color: #fff; }
.panel { display: none; }
.panel.active { display: block; }
.card {
  background: var(--surface); border: 1px solid var(--border);
  border-radius: var(--radius); padding: 20px; margin-bottom: 16px;
}
.card h2 { font-size: 16px; font-weight: 600; margin-bottom: 16px; }
.row { display: flex; gap: 8px; align-items: center; margin-bottom: 12px; flex-wrap: wrap; }
textarea, input, select {
  background: var(--bg); border: 1px solid var(--border); border-radius: 6px;
  color: var(--text); padding: 6px 10px; font-size: 13px; font-family: var(--mono);
}
textarea { width: 100%; min-height: 140px; resize: vertical; }
button.primary {
  background: var(--accent); color: #fff; border: none; border-radius: 6px;
  padding: 8px 16px; cursor: pointer; font-weight: 500;
}
.stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 12px; }
.stat-card { border: 1px solid var(--border); border-radius: var(--radius); padding: 14px; text-align: center; }
.stat-card .value { font-size: 26px; font-weight: 700; font-family: var(--mono); color: var(--accent); }
.stat-card .label { font-size: 12px; color: var(--text-muted); }
.good { color: var(--green) !important; }
.fair { color: var(--yellow) !important; }
.poor { color: var(--red) !important; }
table { width: 100%; border-collapse: collapse; font-size: 13px; }
th, td { text-align: left; padding: 8px 12px; border-bottom: 1px solid var(--border); }
th { color: var(--text-muted); font-weight: 500; font-size: 12px; text-transform: uppercase; }
td.num, th.num { text-align: right; font-family: var(--mono); }
ul.list { margin-left: 18px; }
.chart { display: flex; align-items: flex-end; gap: 4px; height: 160px; padding-top: 20px; margin-bottom: 8px; }
.chart .bar { flex: 1; max-width: 28px; background: var(--accent); border-radius: 3px 3px 0 0; min-height: 2px; }
.chart .bar.forecast { background: var(--purple); opacity: 0.6; }
.muted { color: var(--text-muted); font-size: 12px; }
pre { white-space: pre-wrap; font-family: var(--mono); font-size: 12px; }
.toast {
  position: fixed; bottom: 24px; right: 24px; background: var(--surface); border: 1px solid var(--green);
  color: var(--text); padding: 10px 16px; border-radius: var(--radius); opacity: 0; transition: opacity 0.2s;
}
.toast.show { opacity: 1; }
.toast.error { border-color: var(--red); }
</style>
</head>
<body>
<div class="app">
<header>
  <h1><span class="logo">enhance</span> prompt dashboard</h1>
  <div id="health"></div>
</header>

<nav id="nav">
  <button class="active" data-panel="analyze">Analyze</button>
  <button data-panel="trends">Trends</button>
  <button data-panel="compare">Compare</button>
  <button data-panel="prompts">Prompts</button>
  <button data-panel="templates">Templates</button>
</nav>

<section class="panel active" id="panel-analyze">
  <div class="card">
    <h2>Prompt</h2>
    <textarea id="prompt" placeholder="Paste a prompt to score..."></textarea>
    <div class="row" style="margin-top:12px">
      <input id="prompt-name" placeholder="label (optional)">
      <label><input type="checkbox" id="use-ai"> use AI</label>
      <button class="primary" onclick="runAnalyze('/api/analyze')">Analyze</button>
      <button class="primary" onclick="runAnalyze('/api/optimize')">Optimize</button>
    </div>
  </div>
  <div class="card" id="result" style="display:none"></div>
</section>

<section class="panel" id="panel-trends">
  <div class="card">
    <div class="row">
      <select id="trend-metric">
        <option>overall_score</option><option>semantic_clarity</option>
        <option>structural_integrity</option><option>logical_coherence</option>
        <option>specificity_score</option><option>instruction_clarity</option>
        <option>context_completeness</option>
      </select>
      <select id="trend-days"><option>7</option><option selected>30</option><option>90</option></select>
      <button class="primary" onclick="loadTrends()">Refresh</button>
      <a class="muted" href="/api/export.csv" download="enhance-history.csv">Export CSV</a>
    </div>
    <div class="stats-grid" id="trend-stats"></div>
  </div>
  <div class="card"><div class="chart" id="trend-chart"></div><div class="muted" id="trend-empty"></div></div>
</section>

<section class="panel" id="panel-compare">
  <div class="card">
    <h2>Ranking</h2>
    <table><thead id="compare-head"></thead><tbody id="compare-body"></tbody></table>
    <p class="muted" id="compare-summary" style="margin-top:12px"></p>
  </div>
</section>

<section class="panel" id="panel-prompts">
  <div class="card">
    <div class="row">
      <input id="pr-q" placeholder="search">
      <select id="pr-category"><option value="">all categories</option></select>
      <button class="primary" onclick="loadPrompts()">Search</button>
    </div>
    <table>
      <thead><tr><th>Prompt</th><th>Category</th><th class="num">Last score</th><th></th></tr></thead>
      <tbody id="pr-body"></tbody>
    </table>
  </div>
  <div class="card">
    <h2>Save prompt</h2>
    <div class="row"><input id="pr-title" placeholder="title (optional)"><input id="pr-new-category" placeholder="category"><input id="pr-tags" placeholder="tags, comma separated"></div>
    <textarea id="pr-content" placeholder="Prompt text"></textarea>
    <div class="row" style="margin-top:12px"><button class="primary" onclick="createPrompt()">Save</button></div>
  </div>
</section>

<section class="panel" id="panel-templates">
  <div class="card">
    <div class="row">
      <input id="tpl-q" placeholder="search">
      <select id="tpl-category"><option value="">all categories</option></select>
      <button class="primary" onclick="loadTemplates()">Search</button>
    </div>
    <table>
      <thead><tr><th>Name</th><th>Category</th><th class="num">Rating</th><th class="num">Uses</th><th>Tags</th></tr></thead>
      <tbody id="tpl-body"></tbody>
    </table>
  </div>
  <div class="card">
    <h2>New template</h2>
    <div class="row"><input id="new-name" placeholder="name"><input id="new-category" placeholder="category"><input id="new-tags" placeholder="tags, comma separated"></div>
    <textarea id="new-content" placeholder="Use {{variable}} placeholders"></textarea>
    <div class="row" style="margin-top:12px"><button class="primary" onclick="createTemplate()">Save</button></div>
  </div>
</section>
</div>
<div class="toast" id="toast"></div>

<script>
// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  const data = await res.json();
  if (!res.ok) throw new Error(data.error || res.statusText);
  return data;
}

function toast(msg, isError) {
  const el = document.getElementById('toast');
  el.textContent = msg;
  el.className = 'toast show' + (isError ? ' error' : '');
  setTimeout(() => el.className = 'toast', 3000);
}

function grade(score) {
  return score >= 80 ? 'good' : score >= 60 ? 'fair' : 'poor';
}

function num(n) {
  if (n === undefined || n === null) return '-';
  return Number(n).toFixed(1);
}

function esc(s) {
  if (!s) return '';
  return String(s).replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;').replace(/"/g,'&quot;');
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------
document.getElementById('nav').addEventListener('click', e => {
  const panel = e.target.dataset && e.target.dataset.panel;
  if (!panel) return;
  document.querySelectorAll('nav button').forEach(b => b.classList.remove('active'));
  e.target.classList.add('active');
  document.querySelectorAll('.panel').forEach(p => p.classList.remove('active'));
  document.getElementById('panel-' + panel).classList.add('active');
  if (panel === 'trends') loadTrends();
  if (panel === 'compare') loadCompare();
  if (panel === 'prompts') { loadPromptCategories(); loadPrompts(); }
  if (panel === 'templates') { loadCategories(); loadTemplates(); }
});

// ---------------------------------------------------------------------------
// Analyze / optimize
// ---------------------------------------------------------------------------
async function runAnalyze(path) {
  const text = document.getElementById('prompt').value;
  const name = document.getElementById('prompt-name').value;
  const use_ai = document.getElementById('use-ai').checked;
  try {
    const data = await api('POST', path, { text, name, use_ai });
    renderResult(data.analysis ? data : { analysis: data });
  } catch (e) {
    toast('Analysis failed: ' + e.message, true);
  }
}

function renderResult(r) {
  const a = r.analysis;
  const m = a.metrics;
  const dims = ['semantic_clarity', 'structural_integrity', 'logical_coherence',
    'specificity_score', 'instruction_clarity', 'context_completeness'];
  let html = `<h2>Overall <span class="${grade(m.overall_score)}">${m.overall_score}</span>
    <span class="muted">${esc(a.model_used)} · ${a.token_count} tokens · ${a.processing_ms} ms</span></h2>
    <div class="stats-grid">` +
    dims.map(d => `<div class="stat-card"><div class="value ${grade(m[d])}">${m[d]}</div><div class="label">${d.replace(/_/g, ' ')}</div></div>`).join('') +
    `</div>`;
  const list = (title, items) => items && items.length
    ? `<h2 style="margin-top:16px">${title}</h2><ul class="list">${items.map(i => `<li>${esc(i)}</li>`).join('')}</ul>` : '';
  if (r.suggestions) {
    html += `<h2 style="margin-top:16px">Suggestions <span class="muted">estimated +${r.estimated_score_improvement}</span></h2>`;
    html += r.suggestions.map(s => `<div class="card"><b>${esc(s.title)}</b>
      <span class="muted">${esc(s.priority)} priority</span>
      <span class="muted">${esc(s.impact)} impact</span><p>${esc(s.description)}</p><pre>${esc(s.improvement_plan)}</pre></div>`).join('');
    html += list('For your use case', r.personalized_recommendations);
  } else {
    html += list('Strengths', a.strengths) + list('Weaknesses', a.weaknesses) + list('Suggestions', a.suggestions);
  }
  const el = document.getElementById('result');
  el.innerHTML = html;
  el.style.display = 'block';
}

// ---------------------------------------------------------------------------
// Trends
// ---------------------------------------------------------------------------
async function loadTrends() {
  const metric = document.getElementById('trend-metric').value;
  const days = document.getElementById('trend-days').value;
  try {
    renderTrends(await api('GET', `/api/trends?metric=${metric}&days=${days}`));
  } catch (e) {
    toast('Failed to load trends: ' + e.message, true);
  }
}

function renderTrends(t) {
  const s = t.stats;
  const arrow = s.trend === 'up' ? '▲' : s.trend === 'down' ? '▼' : '■';
  document.getElementById('trend-stats').innerHTML = [
    ['current', num(s.current)], ['previous', num(s.previous)],
    ['change', `${arrow} ${num(s.changePercent)}%`], ['avg', num(s.avg)],
    ['max', num(s.max)], ['min', num(s.min)],
  ].map(([label, v]) => `<div class="stat-card"><div class="value">${v}</div><div class="label">${label}</div></div>`).join('');

  const points = t.series.map(p => ({ ...p, forecast: false }))
    .concat(t.forecast.map(p => ({ ...p, forecast: true })));
  document.getElementById('trend-empty').textContent = points.length ? '' : 'No analyses in this window.';
  const max = Math.max(...points.map(p => p.value), 1);
  document.getElementById('trend-chart').innerHTML = points.map(p =>
    `<div class="bar${p.forecast ? ' forecast' : ''}" style="height:${Math.max(p.value / max * 100, 2)}%" title="${p.timestamp}: ${num(p.value)}"></div>`
  ).join('');
}

// ---------------------------------------------------------------------------
// Compare
// ---------------------------------------------------------------------------
async function loadCompare() {
  try {
    const c = await api('GET', '/api/compare');
    const metrics = c.metric_means.map(m => m.metric);
    document.getElementById('compare-head').innerHTML =
      `<tr><th>#</th><th>Prompt</th><th class="num">Avg</th>${metrics.map(m => `<th class="num">${m.split('_')[0]}</th>`).join('')}</tr>`;
    document.getElementById('compare-body').innerHTML = c.ranking.map(r =>
      `<tr><td>${r.rank}</td><td>${esc(r.name)}</td><td class="num">${num(r.avg_score)}</td>${metrics.map(m => `<td class="num">${num(r.metrics[m])}</td>`).join('')}</tr>`
    ).join('');
    document.getElementById('compare-summary').textContent = c.best_metric
      ? `Strongest: ${c.best_metric.metric} (${num(c.best_metric.mean)}) · Weakest: ${c.worst_metric.metric} (${num(c.worst_metric.mean)})`
      : 'No analyses to compare yet.';
  } catch (e) {
    toast('Failed to load comparison: ' + e.message, true);
  }
}

// ---------------------------------------------------------------------------
// Saved prompts
// ---------------------------------------------------------------------------
async function loadPromptCategories() {
  const cats = await api('GET', '/api/prompts/categories');
  const sel = document.getElementById('pr-category');
  sel.innerHTML = '<option value="">all categories</option>' +
    cats.map(c => `<option value="${esc(c.name)}">${esc(c.name)} (${c.count})</option>`).join('');
}

async function loadPrompts() {
  const q = encodeURIComponent(document.getElementById('pr-q').value);
  const category = encodeURIComponent(document.getElementById('pr-category').value);
  try {
    const page = await api('GET', `/api/prompts?q=${q}&category=${category}&limit=100`);
    const rows = await Promise.all(page.items.map(async p => {
      const a = await api('GET', `/api/prompts/${p.id}/analysis`);
      const last = a.latest ? `<span class="${grade(a.latest.overall_score)}">${a.latest.overall_score}</span>` : '-';
      const label = p.title || p.content.split('\n')[0].slice(0, 60);
      return `<tr><td>${esc(label)}</td><td>${esc(p.category || '-')}</td><td class="num">${last}</td>
        <td><button onclick="analyzePrompt('${p.id}')">Analyze</button></td></tr>`;
    }));
    document.getElementById('pr-body').innerHTML = rows.join('');
  } catch (e) {
    toast('Failed to load prompts: ' + e.message, true);
  }
}

async function analyzePrompt(id) {
  try {
    const a = await api('POST', `/api/prompts/${id}/analyze`);
    toast(`Scored ${a.metrics.overall_score}`);
    loadPrompts();
  } catch (e) {
    toast('Analysis failed: ' + e.message, true);
  }
}

async function createPrompt() {
  const body = {
    title: document.getElementById('pr-title').value || null,
    category: document.getElementById('pr-new-category').value || null,
    tags: document.getElementById('pr-tags').value.split(',').map(t => t.trim()).filter(Boolean),
    content: document.getElementById('pr-content').value,
  };
  try {
    await api('POST', '/api/prompts', body);
    toast('Prompt saved');
    loadPromptCategories();
    loadPrompts();
  } catch (e) {
    toast('Save failed: ' + e.message, true);
  }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------
async function loadCategories() {
  const cats = await api('GET', '/api/templates/categories');
  const sel = document.getElementById('tpl-category');
  sel.innerHTML = '<option value="">all categories</option>' +
    cats.map(c => `<option value="${esc(c.name)}">${esc(c.name)} (${c.count})</option>`).join('');
}

async function loadTemplates() {
  const q = encodeURIComponent(document.getElementById('tpl-q').value);
  const category = encodeURIComponent(document.getElementById('tpl-category').value);
  try {
    const page = await api('GET', `/api/templates?q=${q}&category=${category}&sort_by=usage_count`);
    document.getElementById('tpl-body').innerHTML = page.items.map(t => `<tr>
      <td>${t.is_featured ? '★ ' : ''}${esc(t.name)}</td><td>${esc(t.category || '-')}</td>
      <td class="num">${t.rating_count ? num(t.rating) : '-'}</td><td class="num">${t.usage_count}</td>
      <td class="muted">${esc(t.tags.join(', '))}</td></tr>`).join('');
  } catch (e) {
    toast('Failed to load templates: ' + e.message, true);
  }
}

async function createTemplate() {
  const body = {
    name: document.getElementById('new-name').value,
    category: document.getElementById('new-category').value || null,
    tags: document.getElementById('new-tags').value.split(',').map(t => t.trim()).filter(Boolean),
    content: document.getElementById('new-content').value,
  };
  try {
    await api('POST', '/api/templates', body);
    toast('Template saved');
    loadCategories();
    loadTemplates();
  } catch (e) {
    toast('Save failed: ' + e.message, true);
  }
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------
async function loadHealth() {
  try {
    const h = await api('GET', '/api/health');
    document.getElementById('health').innerHTML =
      `<span class="badge ok">${h.history_records} analyses</span> ` +
      `<span class="badge ${h.ollama_available ? 'ok' : 'warn'}">${h.llm_enabled ? esc(h.model) : 'rule-based'}</span>`;
  } catch (e) {
    toast('Health check failed: ' + e.message, true);
  }
}

loadHealth();
</script>
</body>
</html>"##;
