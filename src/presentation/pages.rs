// Static HTML pages. Charts are drawn client-side from /api/dashboard/stream.

pub fn login_page(error: Option<&str>) -> String {
    let error_block = match error {
        Some(message) => format!(r#"<p id="error-message" class="show">{}</p>"#, message),
        None => r#"<p id="error-message"></p>"#.to_string(),
    };
    LOGIN_HTML.replace("{{error}}", &error_block)
}

const LOGIN_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AgroSmart - Login</title>
    <style>
        body { font-family: system-ui, sans-serif; background: #f1f8e9; display: flex; justify-content: center; align-items: center; min-height: 100vh; margin: 0; }
        form { background: #fff; padding: 2rem; border-radius: 0.5rem; box-shadow: 0 2px 8px rgba(0,0,0,0.1); width: 18rem; }
        label, input, button { display: block; width: 100%; box-sizing: border-box; }
        input { margin: 0.25rem 0 1rem; padding: 0.5rem; }
        button { padding: 0.6rem; background: #2e7d32; color: #fff; border: none; border-radius: 0.25rem; cursor: pointer; }
        #error-message { color: #c62828; display: none; }
        #error-message.show { display: block; }
    </style>
</head>
<body>
    <form id="loginForm" method="post" action="/login">
        <h1>AgroSmart</h1>
        <label for="username">Username</label>
        <input id="username" name="username" autocomplete="username" required>
        <label for="password">Password</label>
        <input id="password" name="password" type="password" autocomplete="current-password" required>
        {{error}}
        <button type="submit">Log in</button>
    </form>
</body>
</html>
"##;

pub const DASHBOARD_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AgroSmart - Dashboard</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4"></script>
    <script src="https://cdn.jsdelivr.net/npm/chartjs-adapter-date-fns@3"></script>
    <style>
        body { font-family: system-ui, sans-serif; background: #f1f8e9; margin: 0; padding: 1.5rem; }
        header { display: flex; justify-content: space-between; align-items: center; }
        .crop-btn { padding: 0.5rem 1rem; margin-right: 0.5rem; border: 1px solid #2e7d32; background: #fff; border-radius: 0.25rem; cursor: pointer; }
        .crop-btn.active { background: #2e7d32; color: #fff; }
        .crop-status.error { color: #c62828; }
        .crop-status.success { color: #2e7d32; }
        #dataGrid { display: grid; grid-template-columns: repeat(auto-fit, minmax(10rem, 1fr)); gap: 1rem; margin: 1rem 0; }
        .readout { background: #fff; padding: 1rem; border-radius: 0.5rem; }
        .charts { display: grid; grid-template-columns: repeat(auto-fit, minmax(22rem, 1fr)); gap: 1rem; }
        .chart { background: #fff; padding: 1rem; border-radius: 0.5rem; height: 16rem; }
        .status-message { padding: 0.5rem 1rem; margin-top: 0.5rem; border-radius: 0.25rem; background: #e3f2fd; }
        .status-message.error { background: #ffebee; }
        .status-message.success { background: #e8f5e9; }
    </style>
</head>
<body>
    <header>
        <h1>AgroSmart Dashboard</h1>
        <form method="post" action="/logout"><button type="submit">Log out</button></form>
    </header>
    <div id="crops"></div>
    <p id="crop-status" class="crop-status"></p>
    <p id="selected-crop-info"></p>
    <div id="dataGrid">
        <div class="readout">Soil Moisture<br><strong id="soilMoisture">--</strong></div>
        <div class="readout">Water Level<br><strong id="waterLevel">-- cm</strong></div>
        <div class="readout">Pump Status<br><strong id="pumpStatus">--</strong></div>
        <div class="readout">Max Threshold<br><strong id="maxThreshold">--</strong></div>
        <div class="readout">Last Updated<br><strong id="lastUpdated">--</strong></div>
    </div>
    <div class="charts">
        <div class="chart"><canvas id="threshold"></canvas></div>
        <div class="chart"><canvas id="soilMoisture-chart"></canvas></div>
        <div class="chart"><canvas id="waterLevel-chart"></canvas></div>
        <div class="chart"><canvas id="pumpStatus-chart"></canvas></div>
    </div>
    <div id="status-messages"></div>
    <script>
        const canvases = { threshold: 'threshold', soilMoisture: 'soilMoisture-chart', waterLevel: 'waterLevel-chart', pumpStatus: 'pumpStatus-chart' };
        const colors = { threshold: 'blue', soilMoisture: 'green', waterLevel: 'aqua', pumpStatus: 'red' };
        const charts = {};

        function chartFor(update) {
            if (charts[update.metric]) return charts[update.metric];
            const canvas = document.getElementById(canvases[update.metric]);
            if (!canvas) return null;
            charts[update.metric] = new Chart(canvas.getContext('2d'), {
                type: 'line',
                data: { datasets: [{ label: update.label, data: [], borderColor: colors[update.metric], fill: false }] },
                options: { responsive: true, maintainAspectRatio: false, animation: false,
                    scales: { x: { type: 'time', time: { unit: 'minute' } }, y: { beginAtZero: true } } }
            });
            return charts[update.metric];
        }

        function redraw(update) {
            const chart = chartFor(update);
            if (!chart) return;
            chart.data.datasets[0].data = update.points.map(p => ({ x: p.time_ms, y: p.value }));
            chart.update();
        }

        async function followCharts() {
            const res = await fetch('/api/dashboard/stream');
            const reader = res.body.getReader();
            const decoder = new TextDecoder();
            let buffered = '';
            for (;;) {
                const { value, done } = await reader.read();
                if (done) break;
                buffered += decoder.decode(value, { stream: true });
                let nl;
                while ((nl = buffered.indexOf('\n')) >= 0) {
                    redraw(JSON.parse(buffered.slice(0, nl)));
                    buffered = buffered.slice(nl + 1);
                }
            }
        }

        function setText(id, text) {
            const e = document.getElementById(id);
            if (e) e.textContent = text;
        }

        async function refresh() {
            const res = await fetch('/api/dashboard');
            if (!res.ok) return;
            const s = await res.json();
            const status = document.getElementById('crop-status');
            status.textContent = s.cropStatusMessage;
            status.className = 'crop-status ' + ({ selected: 'success', failed: 'error' }[s.cropStatus.state] || 'info');
            setText('selected-crop-info', s.cropInfo || '');
            setText('soilMoisture', s.readouts.soilMoisture);
            setText('waterLevel', s.readouts.waterLevel);
            setText('pumpStatus', s.readouts.pumpStatus);
            setText('maxThreshold', s.readouts.threshold);
            setText('lastUpdated', s.readouts.lastUpdated || '--');
            const box = document.getElementById('status-messages');
            box.replaceChildren(...s.notifications.map(n => {
                const d = document.createElement('div');
                d.className = 'status-message ' + n.level;
                d.textContent = n.message;
                return d;
            }));
            document.querySelectorAll('.crop-btn').forEach(b =>
                b.classList.toggle('active', s.selectedCrop && Number(b.dataset.crop) === s.selectedCrop.id));
        }

        async function initCrops() {
            const res = await fetch('/api/crops');
            const { crops } = await res.json();
            const box = document.getElementById('crops');
            for (const crop of crops) {
                const btn = document.createElement('button');
                btn.className = 'crop-btn';
                btn.dataset.crop = crop.id;
                btn.textContent = crop.name;
                btn.addEventListener('click', async () => {
                    setText('crop-status', `Sending crop selection (${crop.name})...`);
                    await fetch(`/api/crops/${crop.id}/select`, { method: 'POST' });
                    refresh();
                });
                box.appendChild(btn);
            }
        }

        initCrops().then(refresh);
        followCharts();
        setInterval(refresh, 3000);
    </script>
</body>
</html>
"##;
